//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod fetch;
pub mod parse;
pub mod templates;

use std::path::Path;

use cardalert_core::CardAlertConfig;
use tracing::debug;

/// Load the config file given on the command line, else the default config
/// file if one exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CardAlertConfig> {
    if let Some(path) = config_path {
        return Ok(CardAlertConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(CardAlertConfig::from_file(&default_path)?)
    } else {
        Ok(CardAlertConfig::default())
    }
}
