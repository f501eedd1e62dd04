// Burstline - Resumable document bursting engine
// Copyright (c) 2025 Burstline Contributors
// Licensed under the MIT License

//! # Burstline - Resumable Document Bursting
//!
//! Burstline splits a record-oriented input (CSV, TSV, JSON, fixed-width)
//! into one document per burst token and distributes every document through
//! the enabled destinations.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Deriving** burst tokens from an id column of the fetched records
//! - **Extracting** one artifact per token (or one for the whole input)
//! - **Distributing** artifacts by e-mail, upload, web or SMS, quarantining failures
//! - **Resuming** interrupted runs from a per-job progress file
//! - **Controlling** running jobs through pause and cancel marker files
//!
//! ## Architecture
//!
//! Burstline follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (engine, progress, QA selection, license gate)
//! - [`adapters`] - Collaborators (fetchers, extractors, senders, hooks, license)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use burstline::adapters::create_collaborators;
//! use burstline::config::load_config;
//! use burstline::core::burst::{BurstEngine, BurstRequest};
//! use burstline::core::state::ResumptionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("burstline.toml")?;
//!     let collaborators = create_collaborators(&config)?;
//!     let store = ResumptionStore::new(&config.state.temp_folder);
//!
//!     let engine = BurstEngine::new(config, collaborators, store);
//!     let outcome = engine.burst(BurstRequest::new("statements.csv")).await?;
//!
//!     println!("Extracted {} documents", outcome.statistics.counters.extracted);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! ### Resumption
//!
//! After every token but the last the engine saves a progress record to
//! `<temp_folder>/<job>.progress`. A later run of the same job validates the
//! record against the freshly derived tokens and skips everything up to the
//! last processed token:
//!
//! ```rust,no_run
//! use burstline::core::state::ResumptionStore;
//! use burstline::domain::JobId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ResumptionStore::new("temp");
//! let job_id = JobId::new("statements")?;
//! if let Some(record) = store.load(&job_id)? {
//!     println!("{} tokens left", record.remaining_token_count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Pause and Cancel
//!
//! Stop requests are marker files, so any process can ask a running job to
//! stop at its next token boundary:
//!
//! ```rust,no_run
//! use burstline::core::control::{CancellationSignal, ControlRequest};
//! use burstline::domain::JobId;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job_id = JobId::new("statements")?;
//! CancellationSignal::request(Path::new("temp"), &job_id, ControlRequest::Pause)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Burstline uses the [`domain::BurstError`] type for all errors:
//!
//! ```rust,no_run
//! use burstline::domain::BurstError;
//!
//! fn example() -> Result<(), BurstError> {
//!     let config = burstline::config::load_config("burstline.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Burstline uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(job = "statements", "Starting burst");
//! warn!(token = "C-1042", "Document quarantined");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
