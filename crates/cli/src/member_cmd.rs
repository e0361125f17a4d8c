use anyhow::{Result, bail};
use clap::Subcommand;
use serde_json::json;
use tenancy_schema::{NewWorkspaceMember, Role, UserId, WorkspaceId, WorkspaceMemberId};

use crate::context::Context;
use crate::output::{print_json, timestamp_or_now};

#[derive(Debug, Clone, Subcommand)]
pub enum MemberAction {
    /// Add a user to a workspace
    Add {
        #[arg(long)]
        workspace: String,
        #[arg(long)]
        user: String,
        /// `admin` or `member`
        #[arg(long, default_value = "member")]
        role: Role,
        /// Epoch milliseconds (defaults to now)
        #[arg(long)]
        joined_at: Option<i64>,
    },
    /// List memberships of a workspace or of a user
    List {
        #[arg(long, conflicts_with = "user")]
        workspace: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Change a membership's role
    Role { id: String, role: Role },
    /// Remove a membership
    Remove { id: String },
}

pub fn run(ctx: &Context, action: MemberAction) -> Result<()> {
    let store = ctx.open_store()?;
    match action {
        MemberAction::Add {
            workspace,
            user,
            role,
            joined_at,
        } => {
            let member = store.add_member(&NewWorkspaceMember {
                workspace_id: WorkspaceId::from(workspace),
                user_id: UserId::from(user),
                role,
                joined_at: timestamp_or_now(joined_at)?,
            })?;
            print_json(&member)
        }
        MemberAction::List { workspace, user } => {
            let members = match (workspace, user) {
                (Some(workspace), _) => store.members_by_workspace(&WorkspaceId::from(workspace))?,
                (None, Some(user)) => store.members_by_user(&UserId::from(user))?,
                (None, None) => bail!("pass --workspace or --user"),
            };
            print_json(&members)
        }
        MemberAction::Role { id, role } => {
            print_json(&store.set_role(&WorkspaceMemberId::from(id), role)?)
        }
        MemberAction::Remove { id } => {
            let id = WorkspaceMemberId::from(id);
            store.remove_member(&id)?;
            print_json(&json!({ "removed": id }))
        }
    }
}
