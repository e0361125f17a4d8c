use tenancy_schema::{UserId, ValidationError, WorkspaceId};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("migration {name} failed")]
    Migration {
        name: String,
        source: rusqlite::Error,
    },
    #[error("{table} document {id} not found")]
    NotFound { table: &'static str, id: String },
    #[error("{field} references missing {table} document {id}")]
    MissingReference {
        field: &'static str,
        table: &'static str,
        id: String,
    },
    #[error("user {user_id} is already a member of workspace {workspace_id}")]
    DuplicateMembership {
        workspace_id: WorkspaceId,
        user_id: UserId,
    },
    #[error(
        "user {id} is still referenced by {workspaces} owned workspace(s) and {memberships} membership(s)"
    )]
    Referenced {
        id: UserId,
        workspaces: i64,
        memberships: i64,
    },
    #[error("the owner's admin membership of workspace {workspace_id} cannot be removed or demoted")]
    OwnerMembership { workspace_id: WorkspaceId },
    #[error("invalid {table} document: {}", join_errors(.errors))]
    Invalid {
        table: String,
        errors: Vec<ValidationError>,
    },
    #[error("system field {field} is assigned by the store")]
    SystemField { field: &'static str },
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("malformed document")]
    Document(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
