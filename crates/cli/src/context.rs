use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tenancy_runtime_config::{TenancyConfig, default_config_path, load_config};
use tenancy_store::{Store, StoreOptions};

/// Resolved config plus command-line overrides.
pub struct Context {
    pub config_path: PathBuf,
    pub config: TenancyConfig,
    db_override: Option<PathBuf>,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, db_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let config = load_config(&config_path)?;
        Ok(Self {
            config_path,
            config,
            db_override,
        })
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db_override {
            Some(path) => Ok(path.clone()),
            None => Ok(self.config.db_path()?),
        }
    }

    /// Open the store, applying pending migrations.
    pub fn open_store(&self) -> Result<Store> {
        let path = self.db_path()?;
        let options = StoreOptions {
            wal: self.config.database.wal,
        };
        Store::open_with(&path, &options).with_context(|| format!("open {}", path.display()))
    }
}
