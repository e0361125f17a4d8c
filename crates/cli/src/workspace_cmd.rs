use anyhow::{Result, anyhow};
use clap::Subcommand;
use serde_json::json;
use tenancy_schema::{NewWorkspace, UserId, WorkspaceId};

use crate::context::Context;
use crate::output::{print_json, timestamp_or_now};

#[derive(Debug, Clone, Subcommand)]
pub enum WorkspaceAction {
    /// Create a workspace; the owner joins it as admin
    Create {
        name: String,
        /// Owning user id
        #[arg(long)]
        owner: String,
        /// Epoch milliseconds (defaults to now)
        #[arg(long)]
        created_at: Option<i64>,
    },
    /// List workspaces, optionally only those one user owns
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show one workspace with its members
    Get { id: String },
    /// Rename a workspace
    Rename { id: String, name: String },
    /// Delete a workspace and its memberships
    Delete { id: String },
}

pub fn run(ctx: &Context, action: WorkspaceAction) -> Result<()> {
    let store = ctx.open_store()?;
    match action {
        WorkspaceAction::Create {
            name,
            owner,
            created_at,
        } => {
            let created = store.create_workspace(&NewWorkspace {
                name,
                owner_id: UserId::from(owner),
                created_at: timestamp_or_now(created_at)?,
            })?;
            print_json(&created)
        }
        WorkspaceAction::List { owner } => {
            let workspaces = match owner {
                Some(owner) => store.workspaces_by_owner(&UserId::from(owner))?,
                None => store.list_workspaces()?,
            };
            print_json(&workspaces)
        }
        WorkspaceAction::Get { id } => {
            let id = WorkspaceId::from(id);
            let workspace = store
                .get_workspace(&id)?
                .ok_or_else(|| anyhow!("workspace not found: {id}"))?;
            let members = store.members_by_workspace(&id)?;
            print_json(&json!({ "workspace": workspace, "members": members }))
        }
        WorkspaceAction::Rename { id, name } => {
            print_json(&store.rename_workspace(&WorkspaceId::from(id), &name)?)
        }
        WorkspaceAction::Delete { id } => {
            let id = WorkspaceId::from(id);
            store.delete_workspace(&id)?;
            print_json(&json!({ "deleted": id }))
        }
    }
}
