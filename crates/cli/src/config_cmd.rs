use anyhow::Result;
use serde::Serialize;
use tenancy_runtime_config::TenancyConfig;

use crate::context::Context;
use crate::output::print_json;

#[derive(Serialize)]
struct ConfigReport<'a> {
    config_path: String,
    config_exists: bool,
    db_path: String,
    config: &'a TenancyConfig,
}

pub fn run_show(ctx: &Context) -> Result<()> {
    print_json(&ConfigReport {
        config_path: ctx.config_path.display().to_string(),
        config_exists: ctx.config_path.exists(),
        db_path: ctx.db_path()?.display().to_string(),
        config: &ctx.config,
    })
}
