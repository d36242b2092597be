//! Validate config command implementation
//!
//! This module implements the `validate-config` command for checking the
//! reporter configuration file without touching the database or SFTP server.

use crate::adapters::database::DatabaseConnector;
use crate::adapters::postgresql::PostgresConnector;
use crate::config::{load_config, ReporterConfig};
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &Path) -> anyhow::Result<i32> {
        println!("🔍 Validating configuration file: {}", config_path.display());
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let database_target = match PostgresConnector::new(&config.database) {
            Ok(connector) => connector.describe(),
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        for line in summary_lines(&config, &database_target) {
            println!("{line}");
        }
        println!();
        Ok(0)
    }
}

/// Configuration summary with secrets left out
fn summary_lines(config: &ReporterConfig, database_target: &str) -> Vec<String> {
    let names: Vec<&str> = config.reports.names.iter().map(|n| n.as_str()).collect();

    vec![
        "Configuration Summary:".to_string(),
        format!("  Log Level: {}", config.application.log_level),
        format!("  Home Directory: {}", config.application.home_dir.display()),
        format!("  Reports: {}", names.join(", ")),
        format!("  Query Directory: {}", config.query_dir().display()),
        format!("  Output Directory: {}", config.output_dir().display()),
        format!("  Database: {}", database_target),
        format!("  Application Name: {}", config.database.application_name),
        format!("  Fetch Size: {}", config.database.fetch_size),
        format!("  SFTP Endpoint: {}", config.transfer.endpoint()),
        format!("  SFTP User: {}", config.transfer.username),
        format!("  Destination: {}", config.transfer.destination_root),
        format!("  Log File: {}", config.log_dir().join(&config.logging.file_name).display()),
    ]
}
