//! Pause and cancel command implementation
//!
//! Both commands drop a marker file into the temp folder; the running job
//! picks it up at its next token boundary.

use crate::cli::commands::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::control::{CancellationSignal, ControlRequest};
use crate::domain::JobId;
use clap::Args;

/// Arguments for the pause and cancel commands
#[derive(Args, Debug)]
pub struct ControlArgs {
    /// Job to signal
    pub job: String,
}

impl ControlArgs {
    /// Execute the pause or cancel command
    pub async fn execute(&self, config_path: &str, request: ControlRequest) -> anyhow::Result<i32> {
        tracing::info!(job = %self.job, request = %request, "Requesting job stop");

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
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        match CancellationSignal::request(&config.state.temp_folder, &job_id, request) {
            Ok(path) => {
                match request {
                    ControlRequest::Pause => println!(
                        "⏸️  Pause requested for job '{}'. Progress will be kept for 'burstline resume'.",
                        job_id
                    ),
                    ControlRequest::Cancel => println!(
                        "⛔ Cancel requested for job '{}'. Its progress will be discarded.",
                        job_id
                    ),
                }
                tracing::debug!(marker = %path.display(), "Marker written");
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to write marker");
                eprintln!("❌ {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case(ControlRequest::Pause, "invoices.pause")]
    #[test_case(ControlRequest::Cancel, "invoices.cancel")]
    #[tokio::test]
    async fn test_control_writes_marker(request: ControlRequest, marker: &str) {
        let dir = TempDir::new().unwrap();
        let temp = dir.path().join("temp");
        let config_path = dir.path().join("burstline.toml");
        fs::write(
            &config_path,
            format!("[state]\ntemp_folder = \"{}\"\n", temp.display()),
        )
        .unwrap();

        let args = ControlArgs {
            job: "invoices".to_string(),
        };
        let code = args
            .execute(&config_path.display().to_string(), request)
            .await
            .unwrap();

        assert_eq!(code, EXIT_SUCCESS);
        assert!(temp.join(marker).exists());
    }

    #[tokio::test]
    async fn test_control_missing_config() {
        let args = ControlArgs {
            job: "invoices".to_string(),
        };
        let code = args
            .execute("does-not-exist.toml", ControlRequest::Pause)
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
