//! Schema-definition API: typed field validators, tables, and indexes.
//!
//! A schema is a plain value. It is built once, checked with
//! [`SchemaDefinition::check`], and then consumed by document validation
//! and DDL generation.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// System field holding the document key.
pub const ID_FIELD: &str = "_id";
/// System field holding the insertion time in epoch milliseconds.
pub const CREATION_TIME_FIELD: &str = "_creationTime";

/// Type of a single document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Validator {
    String,
    Number,
    /// Key of a document in the named table.
    Id { table: &'static str },
    Literal { value: &'static str },
    Union { members: Vec<Validator> },
    Optional { inner: Box<Validator> },
}

impl Validator {
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// The validator with any `Optional` wrapper removed.
    pub fn required(&self) -> &Validator {
        match self {
            Self::Optional { inner } => inner.required(),
            other => other,
        }
    }

    /// Literal values when this is a union made only of literals.
    pub fn literals(&self) -> Option<Vec<&'static str>> {
        match self.required() {
            Self::Literal { value } => Some(vec![*value]),
            Self::Union { members } => members
                .iter()
                .map(|m| match m {
                    Self::Literal { value } => Some(*value),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Human-readable type name used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Id { table } => format!("id<{table}>"),
            Self::Literal { value } => format!("\"{value}\""),
            Self::Union { members } => members
                .iter()
                .map(Validator::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Optional { inner } => format!("optional {}", inner.describe()),
        }
    }
}

/// Validator constructors, mirroring the declaration style of the schema.
pub mod v {
    use super::Validator;

    pub fn string() -> Validator {
        Validator::String
    }

    pub fn number() -> Validator {
        Validator::Number
    }

    pub fn id(table: &'static str) -> Validator {
        Validator::Id { table }
    }

    pub fn literal(value: &'static str) -> Validator {
        Validator::Literal { value }
    }

    pub fn union(members: impl IntoIterator<Item = Validator>) -> Validator {
        Validator::Union {
            members: members.into_iter().collect(),
        }
    }

    pub fn optional(inner: Validator) -> Validator {
        Validator::Optional {
            inner: Box::new(inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub validator: Validator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    pub name: &'static str,
    pub fields: Vec<&'static str>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub name: &'static str,
    pub fields: Vec<FieldDefinition>,
    pub indexes: Vec<IndexDefinition>,
    /// Number fields that must be `>= 0`.
    pub non_negative: Vec<&'static str>,
}

/// Start a table declaration from `(field, validator)` pairs.
pub fn define_table(
    name: &'static str,
    fields: impl IntoIterator<Item = (&'static str, Validator)>,
) -> TableDefinition {
    TableDefinition {
        name,
        fields: fields
            .into_iter()
            .map(|(name, validator)| FieldDefinition { name, validator })
            .collect(),
        indexes: Vec::new(),
        non_negative: Vec::new(),
    }
}

impl TableDefinition {
    pub fn index(mut self, name: &'static str, fields: &[&'static str]) -> Self {
        self.indexes.push(IndexDefinition {
            name,
            fields: fields.to_vec(),
            unique: false,
        });
        self
    }

    /// Declare an index whose key must not repeat across documents.
    pub fn unique_index(mut self, name: &'static str, fields: &[&'static str]) -> Self {
        self.indexes.push(IndexDefinition {
            name,
            fields: fields.to_vec(),
            unique: true,
        });
        self
    }

    pub fn non_negative(mut self, field: &'static str) -> Self {
        self.non_negative.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index_named(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("duplicate table: {table}")]
    DuplicateTable { table: String },
    #[error("{table}: duplicate field {field}")]
    DuplicateField { table: String, field: String },
    #[error("{table}: duplicate index {index}")]
    DuplicateIndex { table: String, index: String },
    #[error("{table}.{index}: unknown field {field}")]
    UnknownIndexField {
        table: String,
        index: String,
        field: String,
    },
    #[error("{table}.{field}: id references unknown table {target}")]
    UnknownIdTarget {
        table: String,
        field: String,
        target: String,
    },
    #[error("{table}.{field}: non-negative constraint needs a number field")]
    InvalidConstraint { table: String, field: String },
    #[error("{table}.{field}: system fields cannot be declared")]
    ReservedField { table: String, field: String },
}

/// A full schema: application tables plus the opaque auth table set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub auth_tables: Vec<&'static str>,
    pub tables: Vec<TableDefinition>,
}

pub fn define_schema(
    auth_tables: &[&'static str],
    tables: impl IntoIterator<Item = TableDefinition>,
) -> SchemaDefinition {
    SchemaDefinition {
        auth_tables: auth_tables.to_vec(),
        tables: tables.into_iter().collect(),
    }
}

impl SchemaDefinition {
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    pub fn auth_tables(&self) -> &[&'static str] {
        &self.auth_tables
    }

    pub fn is_auth_table(&self, name: &str) -> bool {
        self.auth_tables.contains(&name)
    }

    /// Check the declaration for internal consistency.
    pub fn check(&self) -> Result<(), Vec<SchemaError>> {
        let mut errors = Vec::new();
        let mut seen_tables = HashSet::new();
        let known: HashSet<&str> = self
            .tables
            .iter()
            .map(|t| t.name)
            .chain(self.auth_tables.iter().copied())
            .collect();

        for name in self.tables.iter().map(|t| t.name).chain(self.auth_tables.iter().copied()) {
            if !seen_tables.insert(name) {
                errors.push(SchemaError::DuplicateTable {
                    table: name.to_string(),
                });
            }
        }

        for table in &self.tables {
            errors.extend(check_table(table, &known));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_table(table: &TableDefinition, known: &HashSet<&str>) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for field in &table.fields {
        if field.name.starts_with('_') {
            errors.push(SchemaError::ReservedField {
                table: table.name.to_string(),
                field: field.name.to_string(),
            });
        }
        if !seen.insert(field.name) {
            errors.push(SchemaError::DuplicateField {
                table: table.name.to_string(),
                field: field.name.to_string(),
            });
        }
        if let Validator::Id { table: target } = field.validator.required() {
            if !known.contains(target) {
                errors.push(SchemaError::UnknownIdTarget {
                    table: table.name.to_string(),
                    field: field.name.to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    let mut seen_indexes = HashSet::new();
    for index in &table.indexes {
        if !seen_indexes.insert(index.name) {
            errors.push(SchemaError::DuplicateIndex {
                table: table.name.to_string(),
                index: index.name.to_string(),
            });
        }
        for field in &index.fields {
            if table.field(field).is_none() && *field != CREATION_TIME_FIELD {
                errors.push(SchemaError::UnknownIndexField {
                    table: table.name.to_string(),
                    index: index.name.to_string(),
                    field: field.to_string(),
                });
            }
        }
    }

    for field in &table.non_negative {
        let is_number = table
            .field(field)
            .is_some_and(|f| *f.validator.required() == Validator::Number);
        if !is_number {
            errors.push(SchemaError::InvalidConstraint {
                table: table.name.to_string(),
                field: field.to_string(),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_of_union() {
        let role = v::union([v::literal("admin"), v::literal("member")]);
        assert_eq!(role.literals(), Some(vec!["admin", "member"]));
        assert_eq!(v::union([v::literal("a"), v::string()]).literals(), None);
        assert_eq!(v::optional(v::literal("x")).literals(), Some(vec!["x"]));
    }

    #[test]
    fn describe_validators() {
        assert_eq!(v::optional(v::string()).describe(), "optional string");
        assert_eq!(v::id("users").describe(), "id<users>");
        assert_eq!(
            v::union([v::literal("admin"), v::literal("member")]).describe(),
            "\"admin\" | \"member\""
        );
    }

    #[test]
    fn check_reports_every_problem() {
        let schema = define_schema(
            &["users"],
            [
                define_table("users", [("name", v::string())]),
                define_table(
                    "posts",
                    [
                        ("authorId", v::id("authors")),
                        ("title", v::string()),
                        ("title", v::string()),
                        ("_id", v::string()),
                    ],
                )
                .index("by_title", &["title"])
                .index("by_title", &["missing"])
                .non_negative("title"),
            ],
        );
        let errors = schema.check().unwrap_err();
        assert!(errors.contains(&SchemaError::DuplicateTable {
            table: "users".into()
        }));
        assert!(errors.contains(&SchemaError::UnknownIdTarget {
            table: "posts".into(),
            field: "authorId".into(),
            target: "authors".into(),
        }));
        assert!(errors.contains(&SchemaError::DuplicateField {
            table: "posts".into(),
            field: "title".into(),
        }));
        assert!(errors.contains(&SchemaError::DuplicateIndex {
            table: "posts".into(),
            index: "by_title".into(),
        }));
        assert!(errors.contains(&SchemaError::UnknownIndexField {
            table: "posts".into(),
            index: "by_title".into(),
            field: "missing".into(),
        }));
        assert!(errors.contains(&SchemaError::InvalidConstraint {
            table: "posts".into(),
            field: "title".into(),
        }));
        assert!(errors.contains(&SchemaError::ReservedField {
            table: "posts".into(),
            field: "_id".into(),
        }));
    }

    #[test]
    fn index_may_use_creation_time() {
        let schema = define_schema(
            &[],
            [define_table("events", [("kind", v::string())])
                .index("by_kind", &["kind", CREATION_TIME_FIELD])],
        );
        assert!(schema.check().is_ok());
    }
}
