//! Result type alias for burstline

use super::errors::BurstError;

/// Result type alias for burstline operations
///
/// ```
/// use burstline::domain::result::Result;
/// use burstline::domain::errors::BurstError;
///
/// fn failing_function() -> Result<()> {
///     Err(BurstError::Configuration("'Output Folder' cannot be empty".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, BurstError>;
