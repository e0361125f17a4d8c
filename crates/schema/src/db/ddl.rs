//! SQLite DDL generated from a [`SchemaDefinition`].
//!
//! Strings and ids map to TEXT, numbers to BIGINT. Optional fields are
//! nullable, literal unions and non-negative fields get CHECK constraints,
//! and id fields get a foreign key on the target's `_id`. Auth tables are
//! opaque: one JSON `document` column beside the system fields.

use sea_query::{Alias, ColumnDef, Expr, ForeignKey, Index, SqliteQueryBuilder, Table};

use crate::define::{
    CREATION_TIME_FIELD, ID_FIELD, SchemaDefinition, TableDefinition, Validator,
};

/// Column holding the raw document of an auth table.
pub const AUTH_DOCUMENT_COLUMN: &str = "document";

/// SQL name for a table-scoped index. SQLite index names are database-wide.
pub fn index_sql_name(table: &str, index: &str) -> String {
    format!("{table}_{index}")
}

/// Every CREATE statement for `schema`, tables before indexes.
pub fn create_statements(schema: &SchemaDefinition) -> Vec<String> {
    let mut statements: Vec<String> = schema
        .tables()
        .iter()
        .map(|t| create_table(schema, t))
        .collect();
    statements.extend(schema.auth_tables().iter().map(|t| create_auth_table(t)));
    statements.extend(schema.tables().iter().flat_map(create_indexes));
    statements
}

/// The whole schema as one executable batch.
pub fn schema_sql(schema: &SchemaDefinition) -> String {
    let mut sql = create_statements(schema).join(";\n");
    sql.push_str(";\n");
    sql
}

fn system_columns(stmt: &mut sea_query::TableCreateStatement) {
    stmt.col(
        ColumnDef::new(Alias::new(ID_FIELD))
            .text()
            .not_null()
            .primary_key(),
    )
    .col(
        ColumnDef::new(Alias::new(CREATION_TIME_FIELD))
            .big_integer()
            .not_null()
            .check(Expr::col(Alias::new(CREATION_TIME_FIELD)).gte(0)),
    );
}

pub fn create_table(schema: &SchemaDefinition, table: &TableDefinition) -> String {
    let mut stmt = Table::create();
    stmt.table(Alias::new(table.name)).if_not_exists();
    system_columns(&mut stmt);

    for field in &table.fields {
        let mut col = ColumnDef::new(Alias::new(field.name));
        match field.validator.required() {
            Validator::Number => col.big_integer(),
            _ => col.text(),
        };
        if field.validator.is_optional() {
            col.null();
        } else {
            col.not_null();
        }
        if let Some(literals) = field.validator.literals() {
            col.check(Expr::col(Alias::new(field.name)).is_in(literals));
        }
        if table.non_negative.contains(&field.name) {
            col.check(Expr::col(Alias::new(field.name)).gte(0));
        }
        stmt.col(&mut col);
    }

    for field in &table.fields {
        let Validator::Id { table: target } = field.validator.required() else {
            continue;
        };
        if schema.is_auth_table(target) {
            continue;
        }
        stmt.foreign_key(
            ForeignKey::create()
                .from(Alias::new(table.name), Alias::new(field.name))
                .to(Alias::new(*target), Alias::new(ID_FIELD)),
        );
    }

    stmt.to_string(SqliteQueryBuilder)
}

pub fn create_auth_table(name: &str) -> String {
    let mut stmt = Table::create();
    stmt.table(Alias::new(name)).if_not_exists();
    system_columns(&mut stmt);
    stmt.col(ColumnDef::new(Alias::new(AUTH_DOCUMENT_COLUMN)).text().not_null());
    stmt.to_string(SqliteQueryBuilder)
}

pub fn create_indexes(table: &TableDefinition) -> Vec<String> {
    table
        .indexes
        .iter()
        .map(|index| {
            let mut stmt = Index::create();
            stmt.if_not_exists()
                .name(index_sql_name(table.name, index.name))
                .table(Alias::new(table.name));
            for field in &index.fields {
                stmt.col(Alias::new(*field));
            }
            if index.unique {
                stmt.unique();
            }
            stmt.to_string(SqliteQueryBuilder)
        })
        .collect()
}
