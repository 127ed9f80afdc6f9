//! Config command - inspect and create the cardalert configuration file.
//!
//! Every subcommand works on the file named by the global `--config` flag
//! when one is given, and on the per-user default location otherwise.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use cardalert_core::CardAlertConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as JSON
    Show,

    /// Write a configuration file holding the defaults
    Init {
        /// Where to write the file (default: the active config path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value by dotted key (e.g. "normalizer.max_depth")
    Get { key: String },

    /// Print the active config path and whether it exists
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let active = active_config_path(config_path);

    match args.command {
        ConfigCommand::Show => {
            if !active.exists() {
                println!("{} {} not found, showing defaults.", style("ℹ").blue(), active.display());
            }
            let config = super::load_config(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { output, force } => {
            init_config(&output.unwrap_or(active), force)?;
        }
        ConfigCommand::Get { key } => {
            let config = super::load_config(config_path)?;
            println!("{}", serde_json::to_string_pretty(&lookup(&config, &key)?)?);
        }
        ConfigCommand::Path => {
            let status = if active.exists() {
                style("exists").green()
            } else {
                style("not created").yellow()
            };
            println!("{} ({})", active.display(), status);
        }
    }

    Ok(())
}

/// Per-user config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cardalert")
        .join("config.json")
}

fn active_config_path(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    CardAlertConfig::default().save(path)?;

    println!("{} Wrote default configuration to {}", style("✓").green(), path.display());
    Ok(())
}

/// Walk a dotted key through the serialized config.
fn lookup(config: &CardAlertConfig, key: &str) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(config)?;
    for part in key.split('.') {
        value = value
            .get_mut(part)
            .map(serde_json::Value::take)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }
    Ok(value)
}
