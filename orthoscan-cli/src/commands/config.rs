//! Configuration CLI commands.
//!
//! Provides `config path` and `config show` for inspecting where settings
//! come from and what they resolve to.

use std::path::Path;

use clap::Subcommand;
use orthoscan::config::{config_file_path, ConfigFile};

use super::common::load_config;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, explicit: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(explicit),
        ConfigCommands::Show => run_show(explicit),
    }
}

fn run_path(explicit: Option<&Path>) -> Result<(), CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path().ok_or_else(|| {
            CliError::Config("Could not determine the user configuration directory".to_string())
        })?,
    };

    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist; built-in defaults apply)");
    }
    Ok(())
}

fn run_show(explicit: Option<&Path>) -> Result<(), CliError> {
    let config: ConfigFile = load_config(explicit)?;
    let text = config
        .to_ini_string()
        .map_err(|e| CliError::Config(format!("Failed to render configuration: {}", e)))?;
    print!("{}", text);
    Ok(())
}
