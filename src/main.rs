// Reporter - Scheduled database report delivery
// Copyright (c) 2025 Reporter Contributors
// Licensed under the MIT License

use clap::Parser;
use reporter::cli::{Cli, Commands};
use std::process;

#[tokio::main]
async fn main() {
    // .env is optional; a missing file is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    let config_path = cli.config_path();
    match cli.command() {
        Commands::Run(args) => args.execute(&config_path, cli.log_level.as_deref()).await,
        Commands::ValidateConfig(args) => args.execute(&config_path).await,
    }
}
