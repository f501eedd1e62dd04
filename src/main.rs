// Burstline - Resumable document bursting engine
// Copyright (c) 2025 Burstline Contributors
// Licensed under the MIT License

use burstline::cli::commands::EXIT_UNEXPECTED;
use burstline::cli::{Cli, Commands};
use burstline::config::{load_config, LoggingConfig};
use burstline::core::control::ControlRequest;
use burstline::logging::init_logging;
use clap::Parser;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // File logging follows the configuration when it loads; commands report
    // configuration errors themselves
    let config = load_config(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = match (&cli.command, &config) {
        (Commands::Burst(_) | Commands::Resume(_), Some(c)) => c.logging.clone(),
        _ => LoggingConfig {
            local_enabled: false,
            ..LoggingConfig::default()
        },
    };

    let logging_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_UNEXPECTED);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Burstline - Resumable document bursting engine"
    );

    // Create shutdown signal channel; running bursts turn it into a pause request
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), requesting pause...");
                    let _ = shutdown_tx.send(true);
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, requesting pause...");
                    let _ = shutdown_tx.send(true);
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), requesting pause...");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            burstline::log_error_with_context!(&e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_UNEXPECTED
        }
    };

    // flush file logs before exiting
    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Burst(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Resume(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Pause(args) => args.execute(&cli.config, ControlRequest::Pause).await,
        Commands::Cancel(args) => args.execute(&cli.config, ControlRequest::Cancel).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
