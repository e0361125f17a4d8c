use anyhow::{Result, anyhow};
use clap::Subcommand;
use tenancy_schema::{NewUser, UserId};

use crate::context::Context;
use crate::output::print_json;

#[derive(Debug, Clone, Subcommand)]
pub enum UserAction {
    /// Insert a user. Every field is optional.
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Show one user by id
    Get { id: String },
    /// Look users up by email
    Find {
        #[arg(long)]
        email: String,
    },
}

pub fn run(ctx: &Context, action: UserAction) -> Result<()> {
    let store = ctx.open_store()?;
    match action {
        UserAction::Add { name, email, image } => {
            let user = store.insert_user(&NewUser { name, email, image })?;
            print_json(&user)
        }
        UserAction::Get { id } => {
            let id = UserId::from(id);
            let user = store
                .get_user(&id)?
                .ok_or_else(|| anyhow!("user not found: {id}"))?;
            print_json(&user)
        }
        UserAction::Find { email } => print_json(&store.users_by_email(&email)?),
    }
}
