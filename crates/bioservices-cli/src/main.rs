//! bioservices CLI - Main entry point

use bioservices_cli::{Cli, Commands, ConfigCommand};
use bioservices_common::logging::{init_logging, LogConfig};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    // BIOSERVICES_LOG_* variables take precedence over --verbose
    let log_config = LogConfig::cli(cli.verbose);
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn execute_command(cli: &Cli) -> bioservices_cli::Result<()> {
    let Some(ref command) = cli.command else {
        unreachable!("Command should have been validated in main");
    };
    let config = cli.config.as_deref();

    match command {
        Commands::DownloadAccession {
            accession,
            method,
            output,
        } => {
            bioservices_cli::commands::download::run(
                config,
                accession,
                method,
                output.as_deref(),
            )
            .await
        },

        Commands::Config { command } => match command {
            ConfigCommand::Show => bioservices_cli::commands::config::show(config),
            ConfigCommand::Path => bioservices_cli::commands::config::path(config),
            ConfigCommand::Init { force } => bioservices_cli::commands::config::init(config, *force),
            ConfigCommand::Get { key } => bioservices_cli::commands::config::get(config, key),
            ConfigCommand::Set { key, value } => {
                bioservices_cli::commands::config::set(config, key, value)
            },
        },

        Commands::Services { json } => bioservices_cli::commands::services::run(config, *json),
    }
}
