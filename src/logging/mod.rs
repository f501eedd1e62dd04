//! Logging and observability
//!
//! This module provides structured logging with:
//! - Console output filtered by `RUST_LOG` or the configured level
//! - JSON-formatted local log files with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use burstline::logging::init_logging;
//! use burstline::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(job = "invoices", "Burst started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a burst run
///
/// # Example
///
/// ```no_run
/// use burstline::log_burst_start;
/// use burstline::domain::JobId;
/// use std::path::Path;
///
/// let job_id = JobId::new("invoices").unwrap();
/// log_burst_start!(&job_id, Path::new("invoices.csv"));
/// ```
#[macro_export]
macro_rules! log_burst_start {
    ($job_id:expr, $source:expr) => {
        tracing::info!(
            job = %$job_id,
            source = %$source.display(),
            "Starting burst"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use burstline::log_error_with_context;
/// use burstline::domain::BurstError;
///
/// let error = BurstError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
