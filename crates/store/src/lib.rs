pub mod audit;
mod documents;
mod error;
mod members;
pub mod sql;
mod users;
mod workspaces;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tenancy_schema::SchemaDefinition;
use tenancy_schema::app::app_schema;
use tenancy_schema::db::migrations::{MIGRATIONS, Migration};

pub use audit::Violation;
pub use error::{Result, StoreError};
pub use workspaces::CreatedWorkspace;

/// Connection options for file-backed stores.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Use write-ahead logging.
    pub wal: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { wal: true }
    }
}

/// Embedded SQLite store for the application schema.
/// Thread-safe: wraps the connection in a Mutex so it can be shared via `Arc<Store>`.
pub struct Store {
    conn: Mutex<Connection>,
    schema: SchemaDefinition,
}

impl Store {
    /// Open (or create) the store at `path` with default options.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &StoreOptions::default())
    }

    pub fn open_with(path: &Path, options: &StoreOptions) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        if options.wal {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }
        tracing::debug!(path = %path.display(), "opened store");
        Self::from_connection(conn)
    }

    /// A private in-memory store, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn, MIGRATIONS)?;
        Ok(Self {
            conn: Mutex::new(conn),
            schema: app_schema(),
        })
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Names of applied migrations, in application order.
    pub fn applied_migrations(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name FROM _migrations ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    // SQLite state stays consistent when a holder panics; keep serving.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_migrations(conn: &Connection, migrations: &[Migration]) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in migrations {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;

        if !already_applied {
            conn.execute_batch(sql)
                .map_err(|source| StoreError::Migration {
                    name: name.to_string(),
                    source,
                })?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_schema() {
        let store = testing::store();
        assert_eq!(store.applied_migrations().unwrap(), vec!["0001_schema"]);
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tenancy.db");
        {
            let store = Store::open(&path).unwrap();
            testing::user(&store, "a@example.com");
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.applied_migrations().unwrap(), vec!["0001_schema"]);
        assert_eq!(store.users_by_email("a@example.com").unwrap().len(), 1);
    }

    #[test]
    fn open_without_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.db");
        let store = Store::open_with(&path, &StoreOptions { wal: false }).unwrap();
        let mode: String = testing::raw(&store)
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_ne!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn creates_every_declared_index() {
        let store = testing::store();
        let conn = testing::raw(&store);
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(
            names,
            vec![
                "users_by_email",
                "workspaceMembers_by_user",
                "workspaceMembers_by_workspace",
                "workspaceMembers_by_workspace_user",
                "workspaces_by_owner",
            ]
        );
    }

    #[test]
    fn failed_migration_is_not_recorded() {
        let conn = Connection::open_in_memory().unwrap();
        let bad: &[Migration] = &[("0001_bad", "CREATE TABLE (;")];
        let err = run_migrations(&conn, bad).unwrap_err();
        assert!(matches!(err, StoreError::Migration { ref name, .. } if name == "0001_bad"));
        assert_eq!(err.to_string(), "migration 0001_bad failed");
        assert!(std::error::Error::source(&err).is_some());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    /// Column, foreign key and index layout of every user table.
    fn layout(conn: &Connection) -> Vec<String> {
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT IN ('_migrations', 'sqlite_sequence') ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        let mut out = Vec::new();
        for table in tables {
            let mut stmt = conn
                .prepare(&format!("SELECT name, CASE WHEN upper(type) LIKE '%INT%' THEN 'INTEGER' ELSE upper(type) END, \"notnull\", pk FROM pragma_table_info('{table}')"))
                .unwrap();
            let columns = stmt
                .query_map([], |row| {
                    Ok(format!(
                        "{table}.{}:{}:{}:{}",
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?
                    ))
                })
                .unwrap()
                .collect::<rusqlite::Result<Vec<_>>>()
                .unwrap();
            out.extend(columns);

            let mut stmt = conn
                .prepare(&format!("SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list('{table}') ORDER BY \"from\""))
                .unwrap();
            let keys = stmt
                .query_map([], |row| {
                    Ok(format!(
                        "{table}.{}->{}.{}",
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?
                    ))
                })
                .unwrap()
                .collect::<rusqlite::Result<Vec<_>>>()
                .unwrap();
            out.extend(keys);

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT il.name, il.\"unique\", group_concat(ii.name, ',') \
                     FROM pragma_index_list('{table}') il, pragma_index_info(il.name) ii \
                     WHERE il.origin = 'c' GROUP BY il.name ORDER BY il.name"
                ))
                .unwrap();
            let indexes = stmt
                .query_map([], |row| {
                    Ok(format!(
                        "{table} index {}:{}:{}",
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?
                    ))
                })
                .unwrap()
                .collect::<rusqlite::Result<Vec<_>>>()
                .unwrap();
            out.extend(indexes);
        }
        out
    }

    #[test]
    fn frozen_migration_matches_declared_schema() {
        let frozen = Connection::open_in_memory().unwrap();
        run_migrations(&frozen, MIGRATIONS).unwrap();

        let generated = Connection::open_in_memory().unwrap();
        let sql = tenancy_schema::db::ddl::schema_sql(&app_schema());
        generated.execute_batch(&sql).unwrap();

        let frozen_layout = layout(&frozen);
        assert!(!frozen_layout.is_empty());
        assert_eq!(frozen_layout, layout(&generated));
    }
}
