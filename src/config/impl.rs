use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Falls back to defaults when `init_config` has not been called.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads `path` (or `config.toml` when `None`) plus `SHORTENER__*` environment
/// overrides. Calling it again replaces the stored configuration.
pub fn init_config(path: Option<&str>) -> Result<()> {
    let loaded = Arc::new(StaticConfig::load_from(path)?);
    CONFIG
        .get_or_init(|| ArcSwap::new(loaded.clone()))
        .store(loaded);
    Ok(())
}
