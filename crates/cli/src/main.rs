mod config_cmd;
mod context;
mod member_cmd;
mod output;
mod schema_cmd;
mod user_cmd;
mod workspace_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use context::Context;
use tenancy_runtime_config::LoggingSettings;

#[derive(Parser)]
#[command(name = "tenancy", about = "tenancy CLI - workspaces, members and their schema")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding `database.path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Schema(SchemaCommand),

    #[command(flatten)]
    Data(DataCommand),
}

/// Commands that only need the compiled-in schema.
#[derive(Subcommand)]
enum SchemaCommand {
    /// Print the schema declaration or its SQL
    Schema {
        #[arg(long, value_enum, default_value_t = schema_cmd::SchemaFormat::Json)]
        format: schema_cmd::SchemaFormat,
    },

    /// Check a JSON document against a table's validators
    Validate {
        table: String,
        /// Path to the document, or `-` for stdin
        file: PathBuf,
    },
}

/// Commands that read the config and open the database.
#[derive(Subcommand)]
enum DataCommand {
    /// Create or upgrade the database
    Migrate,

    /// Scan the database for integrity violations
    Audit,

    /// Manage users
    User {
        #[command(subcommand)]
        action: user_cmd::UserAction,
    },

    /// Manage workspaces
    Workspace {
        #[command(subcommand)]
        action: workspace_cmd::WorkspaceAction,
    },

    /// Manage workspace memberships
    Member {
        #[command(subcommand)]
        action: member_cmd::MemberAction,
    },

    /// Show the effective configuration
    Config,
}

fn init_tracing(filter: &str) {
    let env_filter = if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::try_new(filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Schema(command) => {
            init_tracing(&LoggingSettings::default().filter);
            match command {
                SchemaCommand::Schema { format } => schema_cmd::run_schema(format),
                SchemaCommand::Validate { table, file } => schema_cmd::run_validate(&table, &file),
            }
        }
        Commands::Data(command) => {
            let ctx = Context::load(cli.config, cli.db)?;
            init_tracing(&ctx.config.logging.filter);
            match command {
                DataCommand::Migrate => schema_cmd::run_migrate(&ctx),
                DataCommand::Audit => schema_cmd::run_audit(&ctx),
                DataCommand::User { action } => user_cmd::run(&ctx, action),
                DataCommand::Workspace { action } => workspace_cmd::run(&ctx, action),
                DataCommand::Member { action } => member_cmd::run(&ctx, action),
                DataCommand::Config => config_cmd::run_show(&ctx),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
