//! Config command - inspect configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use svctag_store::{Config, StoreError};

use super::load_config;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the resolved configuration (credentials are never shown).
    Show,

    /// Show which configuration file is used.
    Path,
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_paths(cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match cli.format {
        OutputFormat::Text => {
            let source = config
                .source
                .as_ref()
                .map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string());
            println!("# Source: {source}");
            print!("{}", config.to_yaml()?);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config.to_file_config())?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let active = Config::locate(cli.config.as_deref()).or_else(|e| match e {
        StoreError::NotFound(_) => Ok(None),
        other => Err(other),
    })?;
    let user = Config::default_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            match &active {
                Some(path) => println!("Active file: {}", path.display()),
                None => println!("Active file: (none, using defaults)"),
            }
            if let Some(path) = &user {
                println!("User file:   {}", path.display());
            }
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "active": active.map(|p| p.display().to_string()),
                "user": user.map(|p| p.display().to_string()),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}
