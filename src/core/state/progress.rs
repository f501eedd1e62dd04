//! Progress record model for resumable runs
//!
//! A progress record describes how far a previous run over a token sequence
//! got. It is only trustworthy against the exact sequence it was written for,
//! which is why it carries enough derived fields to detect drift.

use crate::domain::ids::Token;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current on-disk format of progress records
pub const PROGRESS_FORMAT_VERSION: u32 = 1;

/// Job type recorded for burst runs
pub const JOB_TYPE_BURST: &str = "burst";

/// Durable marker of how far a run got
///
/// # Examples
///
/// ```
/// use burstline::core::state::ProgressRecordBuilder;
/// use burstline::domain::Token;
///
/// let tokens: Vec<Token> = ["a", "b", "c"].into_iter().map(Token::from).collect();
/// let record = ProgressRecordBuilder::new("in/data.csv", &tokens, &tokens[0]).build();
///
/// assert_eq!(record.token_count, 3);
/// assert_eq!(record.index_of_last_token_processed, 0);
/// assert_eq!(record.remaining_token_count, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Serialization format version
    pub format_version: u32,

    /// When this record was written
    pub timestamp: DateTime<Utc>,

    /// Input document the run was bursting
    pub source_file_path: PathBuf,

    /// Kind of job that wrote the record
    pub job_type: String,

    /// Configuration file the run used, if any
    pub config_path: Option<PathBuf>,

    /// Last token fully processed
    pub last_token_processed: Token,

    /// Last token of the sequence the record was written against
    pub last_token_in_sequence: Token,

    /// Length of that sequence
    pub token_count: usize,

    /// Page count of the source, `-1` if unknown
    pub page_count: i64,

    /// Position of `last_token_processed`, `-1` if absent
    pub index_of_last_token_processed: i64,

    /// Tokens left after `last_token_processed`
    pub remaining_token_count: i64,

    /// QA parameters of the run, so a resume selects the same tokens
    pub test_all: bool,
    pub explicit_test_tokens: String,
    pub random_test_token_count: usize,
}

impl ProgressRecord {
    /// Position of `token` in `tokens`, `-1` when absent
    pub fn position(tokens: &[Token], token: &Token) -> i64 {
        tokens
            .iter()
            .position(|t| t == token)
            .map(|i| i as i64)
            .unwrap_or(-1)
    }

    /// Number of tokens after `index` in a sequence of `count` tokens
    pub fn remaining(count: usize, index: i64) -> i64 {
        count as i64 - 1 - index
    }
}

/// Builder for creating ProgressRecord instances
///
/// The derived fields are computed from the token sequence so they always
/// agree with it.
pub struct ProgressRecordBuilder {
    source_file_path: PathBuf,
    last_token_processed: Token,
    last_token_in_sequence: Token,
    token_count: usize,
    index_of_last_token_processed: i64,
    job_type: String,
    config_path: Option<PathBuf>,
    page_count: i64,
    test_all: bool,
    explicit_test_tokens: String,
    random_test_token_count: usize,
    timestamp: Option<DateTime<Utc>>,
}

impl ProgressRecordBuilder {
    /// Create a builder for `last_processed` within `tokens`
    pub fn new(source_file_path: impl Into<PathBuf>, tokens: &[Token], last_processed: &Token) -> Self {
        Self {
            source_file_path: source_file_path.into(),
            last_token_processed: last_processed.clone(),
            last_token_in_sequence: tokens.last().cloned().unwrap_or_else(|| Token::new("")),
            token_count: tokens.len(),
            index_of_last_token_processed: ProgressRecord::position(tokens, last_processed),
            job_type: JOB_TYPE_BURST.to_string(),
            config_path: None,
            page_count: -1,
            test_all: false,
            explicit_test_tokens: String::new(),
            random_test_token_count: 0,
            timestamp: None,
        }
    }

    /// Set the job type
    pub fn job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = job_type.into();
        self
    }

    /// Set the configuration file path
    pub fn config_path(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    /// Set the page count
    pub fn page_count(mut self, page_count: i64) -> Self {
        self.page_count = page_count;
        self
    }

    /// Set the QA parameters of the run
    pub fn quality_assurance(
        mut self,
        test_all: bool,
        explicit_test_tokens: impl Into<String>,
        random_test_token_count: usize,
    ) -> Self {
        self.test_all = test_all;
        self.explicit_test_tokens = explicit_test_tokens.into();
        self.random_test_token_count = random_test_token_count;
        self
    }

    /// Set the timestamp (defaults to now)
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the ProgressRecord instance
    pub fn build(self) -> ProgressRecord {
        ProgressRecord {
            format_version: PROGRESS_FORMAT_VERSION,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            source_file_path: self.source_file_path,
            job_type: self.job_type,
            config_path: self.config_path,
            last_token_processed: self.last_token_processed,
            last_token_in_sequence: self.last_token_in_sequence,
            token_count: self.token_count,
            page_count: self.page_count,
            index_of_last_token_processed: self.index_of_last_token_processed,
            remaining_token_count: ProgressRecord::remaining(
                self.token_count,
                self.index_of_last_token_processed,
            ),
            test_all: self.test_all,
            explicit_test_tokens: self.explicit_test_tokens,
            random_test_token_count: self.random_test_token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<Token> {
        values.iter().map(|v| Token::new(*v)).collect()
    }

    #[test]
    fn test_builder_derives_sequence_fields() {
        let seq = tokens(&["t1", "t2", "t3", "t4", "t5"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[2])
            .config_path(Some(PathBuf::from("burstline.toml")))
            .page_count(10)
            .quality_assurance(false, "t2,t3", 0)
            .build();

        assert_eq!(record.format_version, PROGRESS_FORMAT_VERSION);
        assert_eq!(record.last_token_in_sequence, Token::new("t5"));
        assert_eq!(record.token_count, 5);
        assert_eq!(record.index_of_last_token_processed, 2);
        assert_eq!(record.remaining_token_count, 2);
        assert_eq!(record.page_count, 10);
        assert_eq!(record.explicit_test_tokens, "t2,t3");
        assert_eq!(record.job_type, JOB_TYPE_BURST);
    }

    #[test]
    fn test_position_of_missing_token() {
        let seq = tokens(&["a"]);
        assert_eq!(ProgressRecord::position(&seq, &Token::new("zz")), -1);
        assert_eq!(ProgressRecord::remaining(1, -1), 1);
    }

    #[test]
    fn test_record_serialization() {
        let seq = tokens(&["a", "b"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[0]).build();

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"format_version\":1"));
        assert!(json.contains("\"last_token_processed\":\"a\""));

        let back: ProgressRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
