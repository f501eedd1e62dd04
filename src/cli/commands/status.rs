//! Status command implementation
//!
//! This module implements the `status` command for displaying the jobs that
//! have saved progress and any pending pause or cancel requests.

use crate::cli::commands::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::control::ControlRequest;
use crate::core::state::{ProgressRecord, ResumptionStore};
use crate::domain::JobId;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Filter by job id
    #[arg(long)]
    pub job: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking burst status");

        println!("📊 Burst Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(EXIT_CONFIG);
            }
        };

        let store = ResumptionStore::new(&config.state.temp_folder);
        let (records, failures) = match store.list() {
            Ok(listing) => listing,
            Err(e) => {
                println!("❌ Failed to read progress files");
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
        };

        for (path, error) in &failures {
            println!("⚠️  Unreadable progress file {}: {}", path.display(), error);
        }

        let filtered: Vec<_> = records
            .iter()
            .filter(|(job_id, _)| match &self.job {
                Some(job) => job_id.as_str() == job,
                None => true,
            })
            .collect();

        if filtered.is_empty() {
            println!("No saved progress found.");
            println!("Paused or interrupted jobs appear here; run 'burstline burst <input>' to start one.");
            return Ok(EXIT_SUCCESS);
        }

        println!("Found {} job(s) with saved progress:", filtered.len());
        println!();
        println!(
            "{:<24} {:<36} {:<20} {:<12} {:<10} {:<12} {:<20}",
            "Job", "Source", "Last Token", "Position", "Remaining", "Pending", "Saved At"
        );
        println!("{}", "-".repeat(140));

        for (job_id, record) in filtered {
            println!(
                "{:<24} {:<36} {:<20} {:<12} {:<10} {:<12} {:<20}",
                job_id.as_str(),
                record.source_file_path.display(),
                record.last_token_processed.as_str(),
                position(record),
                record.remaining_token_count,
                pending_request(&store, job_id),
                record.timestamp.format("%Y-%m-%d %H:%M:%S")
            );
        }

        println!();
        Ok(EXIT_SUCCESS)
    }
}

/// `n/total` position of the last processed token
fn position(record: &ProgressRecord) -> String {
    format!(
        "{}/{}",
        record.index_of_last_token_processed + 1,
        record.token_count
    )
}

fn pending_request(store: &ResumptionStore, job_id: &JobId) -> &'static str {
    [ControlRequest::Pause, ControlRequest::Cancel]
        .into_iter()
        .find(|request| request.marker_path(store.folder(), job_id).exists())
        .map(|request| request.extension())
        .unwrap_or("-")
}
