//! Walkie configuration system.
//!
//! TOML-based configuration for the session coordinator and the relay.
//! All sections use defaults so partial configs (or no config file at
//! all) work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use walkie_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{WalkieConfig, CONFIG_SCHEMA_VERSION};

use walkie_common::ConfigError;

/// Load config from the platform default path and validate it.
///
/// Creates a commented default file if none exists yet.
pub fn load_config() -> Result<WalkieConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &WalkieConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
