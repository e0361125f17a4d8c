use anyhow::{Context as _, Result, bail};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tenancy_schema::app::app_schema;
use tenancy_schema::db::ddl;

use crate::context::Context;
use crate::output::print_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaFormat {
    Json,
    Sql,
}

pub fn run_schema(format: SchemaFormat) -> Result<()> {
    let schema = app_schema();
    match format {
        SchemaFormat::Json => print_json(&schema),
        SchemaFormat::Sql => {
            print!("{}", ddl::schema_sql(&schema));
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct MigrateReport {
    path: String,
    applied: Vec<String>,
}

pub fn run_migrate(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    print_json(&MigrateReport {
        path: ctx.db_path()?.display().to_string(),
        applied: store.applied_migrations()?,
    })
}

#[derive(Serialize)]
struct ValidateReport<'a> {
    table: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub fn run_validate(table: &str, file: &Path) -> Result<()> {
    let raw = read_input(file)?;
    let document: Value =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", file.display()))?;

    let schema = app_schema();
    let errors: Vec<String> = if schema.is_auth_table(table) {
        if document.is_object() {
            Vec::new()
        } else {
            vec!["document must be an object".to_string()]
        }
    } else {
        match schema.validate(table, &document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    };

    let count = errors.len();
    print_json(&ValidateReport {
        table,
        valid: count == 0,
        errors,
    })?;
    if count > 0 {
        bail!("{count} validation error(s) for {table}");
    }
    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("read stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))
}

pub fn run_audit(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let violations = store.audit()?;
    print_json(&violations)?;
    if !violations.is_empty() {
        bail!("{} integrity violation(s) found", violations.len());
    }
    Ok(())
}
