//! Resume command implementation
//!
//! This module implements the `resume` command, which re-runs a job from the
//! source path, configuration and QA parameters stored in its progress file.
//! The engine fast-forwards past the tokens the earlier run completed.

use crate::cli::commands::burst::run_burst;
use crate::cli::commands::{EXIT_CONFIG, EXIT_FATAL};
use crate::config::load_config;
use crate::core::burst::BurstRequest;
use crate::core::state::ResumptionStore;
use crate::domain::JobId;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the resume command
#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Job to resume
    pub job: String,
}

impl ResumeArgs {
    /// Execute the resume command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(job = %self.job, "Resuming job");

        let job_id = match JobId::new(&self.job) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("❌ Invalid job id: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let store = ResumptionStore::new(&config.state.temp_folder);
        let record = match store.load(&job_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                eprintln!(
                    "❌ No saved progress for job '{}' in {}",
                    job_id,
                    store.folder().display()
                );
                return Ok(EXIT_CONFIG);
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load progress");
                eprintln!("❌ {e}");
                return Ok(EXIT_FATAL);
            }
        };

        // the job is re-run with the configuration it was started with
        let config = match &record.config_path {
            Some(stored) if stored.as_os_str() != config_path => match load_config(stored) {
                Ok(c) => {
                    tracing::info!(config_path = %stored.display(), "Using configuration stored in progress file");
                    c
                }
                Err(e) => {
                    crate::log_error_with_context!(&e, "Failed to load stored configuration");
                    eprintln!("❌ {e}");
                    return Ok(EXIT_CONFIG);
                }
            },
            _ => config,
        };

        println!(
            "⏯️  Resuming job '{}' after token '{}' ({} remaining)",
            job_id, record.last_token_processed, record.remaining_token_count
        );

        let request = BurstRequest::from_progress(job_id, &record);
        run_burst(config, request, shutdown_signal).await
    }
}
