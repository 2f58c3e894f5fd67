use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::{DEFAULT_CONFIG_PATH, StaticConfig};

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Only startup code reads this; services receive their settings through
/// constructors.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::load(DEFAULT_CONFIG_PATH)))
        .load_full()
}

/// Initialize the global configuration from "config.toml" in the current directory.
///
/// # Examples
/// ```no_run
/// use linktrail::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    init_config_from(DEFAULT_CONFIG_PATH);
}

/// Initialize the global configuration from a specific file.
///
/// A second call replaces the stored configuration.
pub fn init_config_from(path: &str) {
    let config = Arc::new(StaticConfig::load(path));
    CONFIG
        .get_or_init(|| ArcSwap::new(config.clone()))
        .store(config);
}
