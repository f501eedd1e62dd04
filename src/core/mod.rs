//! Core burst logic for Burstline.
//!
//! This module contains the run state machine and the helpers it consults.
//!
//! # Modules
//!
//! - [`burst`] - Burst engine, record processor and run statistics
//! - [`control`] - Pause and cancel marker files
//! - [`state`] - Progress records for resumable runs
//! - [`qa`] - Quality-assurance token selection
//! - [`license`] - Per-run record ceiling
//! - [`template`] - `${variable}` placeholder resolution
//!
//! # Burst Workflow
//!
//! 1. **Fetch**: Read the records of the input and derive burst tokens
//! 2. **Select**: Pick single or multi-record mode, narrow tokens for QA
//! 3. **Resume**: Validate a saved progress record against the fresh tokens
//! 4. **Process**: Extract, archive and distribute each token in order
//! 5. **Checkpoint**: Save progress after every token but the last
//! 6. **Finalize**: Back up the input, run the end hook, write statistics
//!
//! # Example
//!
//! ```rust,no_run
//! use burstline::adapters::create_collaborators;
//! use burstline::config::load_config;
//! use burstline::core::burst::{BurstEngine, BurstRequest};
//! use burstline::core::state::ResumptionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("burstline.toml")?;
//! let collaborators = create_collaborators(&config)?;
//! let store = ResumptionStore::new(&config.state.temp_folder);
//!
//! let outcome = BurstEngine::new(config, collaborators, store)
//!     .burst(BurstRequest::new("invoices.csv"))
//!     .await?;
//!
//! println!("Extracted: {}", outcome.statistics.counters.extracted);
//! println!("Distributed: {}", outcome.statistics.counters.distributed);
//! # Ok(())
//! # }
//! ```

pub mod burst;
pub mod control;
pub mod license;
pub mod qa;
pub mod state;
pub mod template;
