//! Domain models and types for burstline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`Token`], [`JobId`])
//! - **Fetched data** ([`RecordSet`], [`Record`], [`TokenIndex`])
//! - **Run state** ([`RunContext`], [`RunCounters`])
//! - **Error types** ([`BurstError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, BurstError>`]:
//!
//! ```rust,no_run
//! use burstline::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = burstline::config::load_config("burstline.toml")?;
//!     println!("bursting into {}", config.burst.output_folder);
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod lifecycle;
pub mod record;
pub mod result;
pub mod run;

pub use errors::BurstError;
pub use ids::{JobId, Token};
pub use lifecycle::LifecyclePoint;
pub use record::{Record, RecordSet, TokenIndex};
pub use result::Result;
pub use run::{RunContext, RunCounters};
