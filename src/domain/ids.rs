//! Domain identifier types
//!
//! Newtype wrappers for the two identifiers the engine passes around: the
//! burst [`Token`] naming one record of a run, and the [`JobId`] that keys
//! the marker and progress files of a job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Burst token newtype wrapper
///
/// Identifies one record's position within a single run's token sequence.
/// Tokens are opaque: they are only unique within one run and their order is
/// the iteration order.
///
/// # Examples
///
/// ```
/// use burstline::domain::ids::Token;
///
/// let token = Token::new("INV-0042");
/// assert_eq!(token.as_str(), "INV-0042");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Synthetic token used when the whole record set is burst as one document
    pub const SINGLE_RECORD: &'static str = "1";

    /// Creates a new token
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The synthetic token of single-record mode
    pub fn single_record() -> Self {
        Self(Self::SINGLE_RECORD.to_string())
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Job identifier newtype wrapper
///
/// Base name of the sentinel markers (`<job>.pause`, `<job>.cancel`) and of
/// the progress file (`<job>.progress`). Defaults to the input file stem.
///
/// # Examples
///
/// ```
/// use burstline::domain::ids::JobId;
/// use std::str::FromStr;
///
/// let job = JobId::from_str("payslips-2024").unwrap();
/// assert_eq!(job.as_str(), "payslips-2024");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId from a string
    ///
    /// # Returns
    ///
    /// Returns `Err` if the id is blank or contains a path separator
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        if id.contains('/') || id.contains('\\') {
            return Err(format!("Job ID '{}' must not contain path separators", id));
        }
        Ok(Self(id))
    }

    /// Derives the job id from the stem of an input file path
    pub fn from_input_path(path: &Path) -> Result<Self, String> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("Cannot derive a job id from '{}'", path.display()))?;
        Self::new(stem)
    }

    /// Returns the job id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_token_creation() {
        let token = Token::new("INV-0042");
        assert_eq!(token.as_str(), "INV-0042");
        assert_eq!(format!("{}", token), "INV-0042");
    }

    #[test]
    fn test_single_record_token() {
        assert_eq!(Token::single_record().as_str(), "1");
    }

    #[test]
    fn test_token_serializes_as_plain_string() {
        let token = Token::new("a@b.com");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"a@b.com\"");
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_job_id_creation() {
        let id = JobId::new("payslips").unwrap();
        assert_eq!(id.as_str(), "payslips");
    }

    #[test]
    fn test_job_id_empty_fails() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("   ").is_err());
    }

    #[test]
    fn test_job_id_rejects_separators() {
        assert!(JobId::new("../etc").is_err());
        assert!(JobId::new("a\\b").is_err());
    }

    #[test]
    fn test_job_id_from_input_path() {
        let id = JobId::from_input_path(&PathBuf::from("/data/in/invoices.2024.csv")).unwrap();
        assert_eq!(id.as_str(), "invoices.2024");
    }
}
