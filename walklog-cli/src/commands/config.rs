//! Configuration CLI commands.
//!
//! Provides `config list` and `config path` for inspecting the settings the
//! other commands run with.

use std::path::Path;

use clap::Subcommand;
use walklog::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// List effective configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, override_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::List => run_list(override_path),
        ConfigCommands::Path => run_path(override_path),
    }
}

/// List all configuration settings.
fn run_list(override_path: Option<&Path>) -> Result<(), CliError> {
    let config = ConfigFile::load(override_path)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";

    for (section, key, value) in config.entries() {
        // Print section header when section changes
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        if value.is_empty() {
            println!("  {} = (not set)", key);
        } else {
            println!("  {} = {}", key, value);
        }
    }

    Ok(())
}

/// Show the configuration file path.
fn run_path(override_path: Option<&Path>) -> Result<(), CliError> {
    let path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    let status = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("{}{}", path.display(), status);
    Ok(())
}
