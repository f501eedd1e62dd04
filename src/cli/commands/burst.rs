//! Burst command implementation
//!
//! This module implements the `burst` command and the run loop shared with
//! `resume`. A shutdown signal received while a run is in progress is turned
//! into a pause marker so the run stops at the next token with its progress
//! saved.

use crate::adapters::create_collaborators;
use crate::cli::commands::{exit_code_for, EXIT_CONFIG, EXIT_STOPPED_EARLY, EXIT_SUCCESS};
use crate::config::{load_config, BurstlineConfig};
use crate::core::burst::{BurstEngine, BurstRequest, RunMode, RunOutcome, StopReason};
use crate::core::control::{CancellationSignal, ControlRequest};
use crate::core::qa::QaRequest;
use crate::core::state::ResumptionStore;
use crate::domain::JobId;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Arguments for the burst command
#[derive(Args, Debug)]
pub struct BurstArgs {
    /// Input document to burst
    pub input: String,

    /// Job id; defaults to the input file name without its extension
    #[arg(long)]
    pub job: Option<String>,

    /// QA mode: burst every token without distributing
    #[arg(long)]
    pub test_all: bool,

    /// QA mode: burst only these tokens (comma-separated)
    #[arg(long, value_name = "TOKENS")]
    pub test_tokens: Option<String>,

    /// QA mode: burst this many randomly chosen tokens
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub test_random: usize,
}

impl BurstArgs {
    /// Execute the burst command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Starting burst command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let mut request = BurstRequest::new(&self.input)
            .with_config_path(Some(PathBuf::from(config_path)))
            .with_qa(self.qa_request());

        if let Some(job) = &self.job {
            match JobId::new(job) {
                Ok(job_id) => request = request.with_job_id(job_id),
                Err(e) => {
                    eprintln!("❌ Invalid job id: {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        }

        run_burst(config, request, shutdown_signal).await
    }

    fn qa_request(&self) -> QaRequest {
        QaRequest {
            test_all: self.test_all,
            test_tokens: self
                .test_tokens
                .as_deref()
                .map(QaRequest::parse_token_list)
                .unwrap_or_default(),
            random_count: self.test_random,
        }
    }
}

/// Run one burst and map its outcome to an exit code
pub(crate) async fn run_burst(
    config: BurstlineConfig,
    request: BurstRequest,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    let job_id = match request.job_id.clone() {
        Some(job_id) => job_id,
        None => match JobId::from_input_path(&request.source) {
            Ok(job_id) => job_id,
            Err(e) => {
                eprintln!("❌ Cannot derive a job id from {}: {e}", request.source.display());
                return Ok(EXIT_CONFIG);
            }
        },
    };
    let request = request.with_job_id(job_id.clone());

    let collaborators = match create_collaborators(&config) {
        Ok(c) => c,
        Err(e) => {
            crate::log_error_with_context!(&e, "Failed to create collaborators");
            eprintln!("❌ Failed to initialize burst: {e}");
            return Ok(exit_code_for(&e));
        }
    };

    let store = ResumptionStore::new(&config.state.temp_folder);
    let marker = ControlRequest::Pause.marker_path(store.folder(), &job_id);
    let watcher = pause_on_shutdown(
        store.folder().to_path_buf(),
        job_id.clone(),
        shutdown_signal.clone(),
    );

    println!("🚀 Bursting {} as job '{}'", request.source.display(), job_id);
    println!();

    let engine = BurstEngine::new(config, collaborators, store);
    let result = engine.burst(request).await;
    watcher.abort();

    // a marker the run never got to observe would pause the next run
    if *shutdown_signal.borrow() && marker.exists() {
        if let Err(e) = std::fs::remove_file(&marker) {
            tracing::error!(marker = %marker.display(), error = %e, "Failed to delete pause marker");
        }
    }

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(if outcome.stop_reason.is_early() {
                EXIT_STOPPED_EARLY
            } else {
                EXIT_SUCCESS
            })
        }
        Err(e) => {
            crate::log_error_with_context!(&e, "Burst failed");
            eprintln!("❌ Burst failed: {e}");
            Ok(exit_code_for(&e))
        }
    }
}

/// Write the pause marker of `job_id` once shutdown is signalled
fn pause_on_shutdown(
    folder: PathBuf,
    job_id: JobId,
    mut shutdown_signal: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while shutdown_signal.changed().await.is_ok() {
            if !*shutdown_signal.borrow() {
                continue;
            }
            match CancellationSignal::request(&folder, &job_id, ControlRequest::Pause) {
                Ok(path) => {
                    tracing::info!(job = %job_id, marker = %path.display(), "Pause requested by shutdown signal");
                    println!("\n⚠️  Shutdown signal received, pausing after the current token...");
                }
                Err(e) => {
                    tracing::error!(job = %job_id, error = %e, "Failed to write pause marker");
                }
            }
            break;
        }
    })
}

fn print_outcome(outcome: &RunOutcome) {
    let stats = &outcome.statistics;
    let counters = &stats.counters;

    println!();
    println!("📊 Burst Summary:");
    println!("  Job: {}", outcome.job_id);
    println!(
        "  Mode: {}",
        match outcome.mode {
            RunMode::SingleRecord => "single record",
            RunMode::MultiRecord => "multi record",
            RunMode::Empty => "empty",
        }
    );
    println!("  Tokens Read: {}", stats.tokens_read);
    println!("  Tokens Processed: {}", outcome.processed.len());
    println!("  Extracted: {}", counters.extracted);
    println!("  Distributed: {}", counters.distributed);
    println!("  Messages Sent: {}", counters.messages_sent);
    println!("  Skipped: {}", counters.skipped);
    println!("  Quarantined: {}", counters.quarantined);
    println!("  Duration: {:.2}s", stats.duration.as_secs_f64());
    if let Some(stats_file) = &stats.stats_file {
        println!("  Statistics: {}", stats_file.display());
    }
    println!();

    match outcome.stop_reason {
        StopReason::Completed if counters.quarantined > 0 => {
            println!("⚠️  Burst completed with quarantined documents");
        }
        StopReason::Completed => println!("✅ Burst completed successfully!"),
        StopReason::Paused => {
            println!("⏸️  Burst paused. Progress saved.");
            println!("   Run 'burstline resume {}' to continue.", outcome.job_id);
        }
        StopReason::Cancelled => println!("⛔ Burst cancelled. Progress discarded."),
        StopReason::LicenseLimit => {
            println!("⚠️  Burst stopped at the license limit. Progress saved.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Token;

    fn args(test_tokens: Option<&str>, test_random: usize) -> BurstArgs {
        BurstArgs {
            input: "invoices.csv".to_string(),
            job: None,
            test_all: false,
            test_tokens: test_tokens.map(str::to_string),
            test_random,
        }
    }

    #[test]
    fn test_qa_request_defaults_to_no_qa() {
        assert!(!args(None, 0).qa_request().is_requested());
    }

    #[test]
    fn test_qa_request_from_flags() {
        let qa = args(Some("a, b,,c"), 2).qa_request();
        assert_eq!(
            qa.test_tokens,
            vec![Token::new("a"), Token::new("b"), Token::new("c")]
        );
        assert_eq!(qa.random_count, 2);
    }

    #[tokio::test]
    async fn test_shutdown_writes_pause_marker() {
        let dir = tempfile::TempDir::new().unwrap();
        let job_id = JobId::new("invoices").unwrap();
        let (tx, rx) = watch::channel(false);

        let watcher = pause_on_shutdown(dir.path().to_path_buf(), job_id.clone(), rx);
        tx.send(true).unwrap();
        watcher.await.unwrap();

        assert!(ControlRequest::Pause.marker_path(dir.path(), &job_id).exists());
    }
}
