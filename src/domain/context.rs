//! Error context extension trait
//!
//! Adds `.context()` / `.with_context()` to any `Result` whose error converts
//! into [`BurstError`]. Unlike `anyhow::Context` the error keeps its variant,
//! so callers can still tell a configuration problem from an I/O failure.
//!
//! ```rust
//! use burstline::domain::Result;
//! use burstline::domain::context::ResultExt;
//!
//! fn read_template(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("reading template {path}"))
//! }
//! ```

use crate::domain::errors::BurstError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    /// Add context to an error, computing it only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BurstError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
