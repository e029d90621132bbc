//! Application state management

use std::path::PathBuf;

use courtside_core::{Config, Database, Result};

/// Loaded configuration plus the open database
pub struct AppState {
    pub config: Config,
    pub db: Database,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open_with(&config.database)?;
        Ok(Self { config, db })
    }
}

/// Load configuration from `COURTSIDE_CONFIG` or the platform config
/// directory; a missing file means defaults
pub fn load_config() -> Result<Config> {
    let path = match std::env::var_os("COURTSIDE_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    Ok(Config::load_or_default(&path)?)
}
