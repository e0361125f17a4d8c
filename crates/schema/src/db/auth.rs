//! Opaque auth-table document query builders.
//!
//! Callers must check the table name against the schema's auth table set.

use sea_query::{Alias, Expr, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::AuthDocuments;
use crate::Timestamp;

pub fn insert(table: &str, id: &str, creation_time: Timestamp, document: &str) -> Built {
    Query::insert()
        .into_table(Alias::new(table))
        .columns([
            AuthDocuments::Id,
            AuthDocuments::CreationTime,
            AuthDocuments::Document,
        ])
        .values_panic([
            id.into(),
            creation_time.as_millis().into(),
            document.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Columns: `_id`, `_creationTime`, `document`.
pub fn get_by_id(table: &str, id: &str) -> Built {
    Query::select()
        .columns([
            AuthDocuments::Id,
            AuthDocuments::CreationTime,
            AuthDocuments::Document,
        ])
        .from(Alias::new(table))
        .and_where(Expr::col(AuthDocuments::Id).eq(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_is_quoted() {
        let (sql, values) = get_by_id("authSessions", "s1");
        assert!(sql.contains(r#"FROM "authSessions""#), "{sql}");
        assert_eq!(values.0.len(), 1);
    }
}
