//! Shared database schema, migrations, and query builders.
//!
//! Used by: the embedded store and the CLI's `schema --format sql` output.

pub mod auth;
pub mod ddl;
pub mod members;
pub mod migrations;
pub mod tables;
pub mod users;
pub mod workspaces;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: SQL text plus bind values in order.
pub type Built = (String, sea_query::Values);
