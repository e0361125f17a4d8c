//! Canonical migration definitions.
//!
//! The store applies these in order and records each name in `_migrations`.
//! Applied migrations are frozen: a schema change ships as a new file.

/// A named migration: `(name, sql)`.
pub type Migration = (&'static str, &'static str);

pub const MIGRATIONS: &[Migration] = &[(
    "0001_schema",
    include_str!("../../migrations/0001_schema.sql"),
)];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::app_schema;
    use crate::db::ddl;

    #[test]
    fn names_are_unique_and_ordered() {
        let names: Vec<_> = MIGRATIONS.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn frozen_schema_names_every_generated_object() {
        let frozen = MIGRATIONS[0].1;
        let schema = app_schema();
        for table in schema.tables() {
            assert!(frozen.contains(&format!("\"{}\" (", table.name)), "{}", table.name);
            for index in &table.indexes {
                let name = ddl::index_sql_name(table.name, index.name);
                assert!(frozen.contains(&format!("\"{name}\"")), "{name}");
            }
        }
        for table in schema.auth_tables() {
            assert!(frozen.contains(&format!("\"{table}\" (")), "{table}");
        }
    }
}
