//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the burstline configuration file and its license.

use crate::adapters::license::FileLicense;
use crate::adapters::LicenseService;
use crate::cli::commands::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load_config, BurstlineConfig, DataSourceKind, OutputKind};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = check_run_settings(&config) {
            println!("❌ Configuration validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(EXIT_CONFIG);
        }

        let license = match FileLicense::load(&config.license) {
            Ok(license) => license,
            Err(e) => {
                println!("❌ License check failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Data Source: {}", describe_datasource(&config.datasource.format));
        println!("  Output: {}", describe_output(&config.output.format));
        println!("  Output Name: {}", config.burst.output_name);
        println!("  Output Folder: {}", config.burst.output_folder);
        println!("  Quarantine Folder: {}", config.burst.quarantine_folder);
        println!("  Logs Archives Folder: {}", config.burst.logs_archives_folder);
        println!("  Destinations: {}", describe_destinations(&config));
        println!(
            "  Fail Job If Any Distribution Fails: {}",
            config.burst.fail_job_if_any_distribution_fails
        );
        println!("  Temp Folder: {}", config.state.temp_folder.display());
        println!(
            "  Hooks: {}",
            if config.hooks.is_empty() {
                "none".to_string()
            } else {
                config.hooks.commands.keys().cloned().collect::<Vec<_>>().join(", ")
            }
        );
        println!(
            "  License: {}",
            if license.is_demo() {
                format!("demo (limit {})", license.limit())
            } else {
                "paid".to_string()
            }
        );
        if license.is_expired() {
            println!("  ⚠️  License expired");
        }
        println!();
        Ok(EXIT_SUCCESS)
    }
}

/// Settings the engine rejects at run start, checked up front
fn check_run_settings(config: &BurstlineConfig) -> Result<(), String> {
    if config.burst.output_name.trim().is_empty() {
        return Err("burst.output_name cannot be empty".to_string());
    }
    if config.burst.output_folder.trim().is_empty() {
        return Err("burst.output_folder cannot be empty".to_string());
    }
    if config.distribution.any_enabled() && config.burst.quarantine_folder.trim().is_empty() {
        return Err(
            "burst.quarantine_folder cannot be empty when a distribution destination is enabled"
                .to_string(),
        );
    }
    if config.distribution.web && config.distribution.web_url.trim().is_empty() {
        return Err("distribution.web_url is required when web distribution is enabled".to_string());
    }
    Ok(())
}

fn describe_datasource(kind: &DataSourceKind) -> String {
    match kind {
        DataSourceKind::Csv { delimiter, .. } => format!("csv (delimiter '{delimiter}')"),
        DataSourceKind::Tsv { .. } => "tsv".to_string(),
        DataSourceKind::Json { records_pointer } => match records_pointer {
            Some(pointer) => format!("json (records at {pointer})"),
            None => "json".to_string(),
        },
        DataSourceKind::FixedWidth { widths, .. } => format!("fixed width {widths:?}"),
    }
}

fn describe_output(kind: &OutputKind) -> String {
    match kind {
        OutputKind::Text { template_path } => format!("text ({})", template_path.display()),
        OutputKind::Json { pretty } => format!("json (pretty: {pretty})"),
    }
}

fn describe_destinations(config: &BurstlineConfig) -> String {
    let distribution = &config.distribution;
    let enabled: Vec<&str> = [
        ("email", distribution.email),
        ("upload", distribution.upload),
        ("web", distribution.web),
        ("sms", distribution.sms),
    ]
    .into_iter()
    .filter(|(_, on)| *on)
    .map(|(name, _)| name)
    .collect();

    if enabled.is_empty() {
        "none".to_string()
    } else {
        enabled.join(", ")
    }
}
