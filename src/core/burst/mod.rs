//! Burst orchestration
//!
//! - [`engine`] - the run state machine
//! - [`processor`] - per-token extraction, attachments and distribution
//! - [`summary`] - run statistics and the statistics file

pub mod engine;
pub mod processor;
pub mod summary;

pub use engine::{BurstEngine, BurstRequest, RunMode, RunOutcome, StopReason};
pub use processor::RecordProcessor;
pub use summary::{RunStatistics, StatisticsReporter};
