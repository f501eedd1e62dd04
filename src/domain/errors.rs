//! Domain error types
//!
//! This module defines the error hierarchy for burstline. Every fallible
//! operation in the library returns [`BurstError`]; third-party error types
//! are converted at the boundary and never leak through the public API.
//!
//! Recoverable recipient failures are not errors: senders report them as
//! [`DistributionOutcome::Invalid`](crate::adapters::DistributionOutcome).

use thiserror::Error;

/// Main burstline error type
#[derive(Debug, Error)]
pub enum BurstError {
    /// A required setting is blank or a setting combination is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied argument is invalid (for example a QA token list)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A saved progress record does not match the freshly discovered tokens
    #[error("{source_file} shows {field} as {stored} but the current token sequence has {actual}")]
    ProgressMismatch {
        /// Source file the progress record was written against
        source_file: String,
        /// Name of the mismatching field
        field: &'static str,
        /// Value stored in the progress record
        stored: String,
        /// Value recomputed from the fresh token sequence
        actual: String,
    },

    /// Nothing to burst: the data source yielded records but no tokens
    #[error("No burst tokens were provided or fetched for the document: {0}")]
    NoTokens(String),

    /// The archive file name template resolved to an empty string
    #[error("You need to provide a valid 'archive_file_name' (template '{0}' resolved to an empty name)")]
    ArchiveName(String),

    /// The statistics folder for this run already exists
    #[error("Folder '{0}' already exists. Please provide a logs_archives_folder configuration which is guaranteed to generate a new folder for each bursting session")]
    StatisticsFolderExists(String),

    /// The data source could not be read or parsed
    #[error("Data source error: {0}")]
    DataSource(String),

    /// The extractor failed to materialize an artifact
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A sender failed at the transport level
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// A lifecycle hook failed
    #[error("Hook error: {0}")]
    Hook(String),

    /// A template could not be read or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// License information could not be loaded
    #[error("License error: {0}")]
    License(String),

    /// Progress persistence errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl BurstError {
    /// Returns true for the errors that abort a run as a configuration problem
    /// rather than as a collaborator failure
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            BurstError::Configuration(_)
                | BurstError::InvalidArgument(_)
                | BurstError::ProgressMismatch { .. }
                | BurstError::NoTokens(_)
                | BurstError::ArchiveName(_)
                | BurstError::StatisticsFolderExists(_)
        )
    }

    /// Prefixes the message with `context` while keeping the error variant
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            BurstError::Configuration(m) => BurstError::Configuration(format!("{context}: {m}")),
            BurstError::InvalidArgument(m) => {
                BurstError::InvalidArgument(format!("{context}: {m}"))
            }
            BurstError::DataSource(m) => BurstError::DataSource(format!("{context}: {m}")),
            BurstError::Extraction(m) => BurstError::Extraction(format!("{context}: {m}")),
            BurstError::Distribution(m) => BurstError::Distribution(format!("{context}: {m}")),
            BurstError::Hook(m) => BurstError::Hook(format!("{context}: {m}")),
            BurstError::Template(m) => BurstError::Template(format!("{context}: {m}")),
            BurstError::License(m) => BurstError::License(format!("{context}: {m}")),
            BurstError::State(m) => BurstError::State(format!("{context}: {m}")),
            BurstError::Serialization(m) => BurstError::Serialization(format!("{context}: {m}")),
            BurstError::Io(m) => BurstError::Io(format!("{context}: {m}")),
            // structured variants carry their own wording
            other => other,
        }
    }
}

impl From<std::io::Error> for BurstError {
    fn from(err: std::io::Error) -> Self {
        BurstError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BurstError {
    fn from(err: serde_json::Error) -> Self {
        BurstError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BurstError {
    fn from(err: toml::de::Error) -> Self {
        BurstError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for BurstError {
    fn from(err: csv::Error) -> Self {
        BurstError::DataSource(format!("CSV error: {err}"))
    }
}

impl From<zip::result::ZipError> for BurstError {
    fn from(err: zip::result::ZipError) -> Self {
        BurstError::Io(format!("archive error: {err}"))
    }
}
