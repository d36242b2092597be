//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the reporter using clap.
//! Running the binary without a subcommand behaves like `reporter run`.

pub mod commands;

use crate::config::default_config_path;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// reporter - scheduled database report delivery
#[derive(Parser, Debug)]
#[command(name = "reporter")]
#[command(version, about, long_about = None)]
#[command(author = "Reporter Contributors")]
pub struct Cli {
    /// Path to configuration file [default: reporter.toml next to the executable]
    #[arg(short, long, global = true, env = "REPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "REPORTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Configuration file to load
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    /// Subcommand to execute, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(commands::run::RunArgs::default()))
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate and deliver every configured report once
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}
