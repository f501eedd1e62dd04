//! Progress record persistence
//!
//! The ResumptionStore keeps one `<job>.progress` JSON file per job in the
//! temp folder, validates saved records against freshly discovered tokens
//! and answers whether a token was already handled by an earlier run.

use crate::core::state::progress::{ProgressRecord, PROGRESS_FORMAT_VERSION};
use crate::domain::context::ResultExt;
use crate::domain::errors::BurstError;
use crate::domain::ids::{JobId, Token};
use crate::domain::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension of progress files
pub const PROGRESS_EXTENSION: &str = "progress";

/// File-backed store of progress records
#[derive(Debug, Clone)]
pub struct ResumptionStore {
    folder: PathBuf,
}

impl ResumptionStore {
    /// Create a store rooted at the temp folder
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Folder holding the progress files
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Path of the progress file of a job
    pub fn progress_path(&self, job_id: &JobId) -> PathBuf {
        self.folder
            .join(format!("{}.{}", job_id.as_str(), PROGRESS_EXTENSION))
    }

    /// Load the progress record of a job
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the job has no progress file.
    ///
    /// # Errors
    ///
    /// Returns a `State` error if the file cannot be read, cannot be parsed
    /// or was written with an unsupported format version.
    pub fn load(&self, job_id: &JobId) -> Result<Option<ProgressRecord>> {
        let path = self.progress_path(job_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BurstError::State(format!(
                    "Failed to read progress file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let record: ProgressRecord = serde_json::from_str(&contents).map_err(|e| {
            BurstError::State(format!(
                "Failed to parse progress file {}: {}",
                path.display(),
                e
            ))
        })?;

        if record.format_version != PROGRESS_FORMAT_VERSION {
            return Err(BurstError::State(format!(
                "Progress file {} has format version {}, expected {}",
                path.display(),
                record.format_version,
                PROGRESS_FORMAT_VERSION
            )));
        }

        Ok(Some(record))
    }

    /// Validate a saved record against the fresh token sequence
    ///
    /// The page count is only compared when the fresh page count is known.
    ///
    /// # Errors
    ///
    /// Returns [`BurstError::ProgressMismatch`] naming the first field that
    /// differs together with both values.
    pub fn validate(record: &ProgressRecord, fresh_tokens: &[Token], fresh_page_count: i64) -> Result<()> {
        let source_file = record.source_file_path.display().to_string();
        let mismatch = |field: &'static str, stored: String, actual: String| {
            BurstError::ProgressMismatch {
                source_file: source_file.clone(),
                field,
                stored,
                actual,
            }
        };

        if record.token_count != fresh_tokens.len() {
            return Err(mismatch(
                "token_count",
                record.token_count.to_string(),
                fresh_tokens.len().to_string(),
            ));
        }

        let last_in_sequence = fresh_tokens.last().map(Token::as_str).unwrap_or_default();
        if record.last_token_in_sequence.as_str() != last_in_sequence {
            return Err(mismatch(
                "last_token_in_sequence",
                record.last_token_in_sequence.to_string(),
                last_in_sequence.to_string(),
            ));
        }

        let index = ProgressRecord::position(fresh_tokens, &record.last_token_processed);
        if record.index_of_last_token_processed != index {
            return Err(mismatch(
                "index_of_last_token_processed",
                record.index_of_last_token_processed.to_string(),
                index.to_string(),
            ));
        }

        let remaining = ProgressRecord::remaining(fresh_tokens.len(), index);
        if record.remaining_token_count != remaining {
            return Err(mismatch(
                "remaining_token_count",
                record.remaining_token_count.to_string(),
                remaining.to_string(),
            ));
        }

        if fresh_page_count > -1 && record.page_count != fresh_page_count {
            return Err(mismatch(
                "page_count",
                record.page_count.to_string(),
                fresh_page_count.to_string(),
            ));
        }

        Ok(())
    }

    /// Returns true when `token` sits at or before the record's last
    /// processed token in `fresh_tokens`
    pub fn is_already_processed(record: &ProgressRecord, token: &Token, fresh_tokens: &[Token]) -> bool {
        let last = ProgressRecord::position(fresh_tokens, &record.last_token_processed);
        let current = ProgressRecord::position(fresh_tokens, token);
        last >= 0 && current >= 0 && current <= last
    }

    /// Save (overwrite or create) the progress record of a job
    ///
    /// The record is written to a temporary file first and renamed into
    /// place so a crash never leaves a truncated progress file behind.
    pub fn save(&self, job_id: &JobId, record: &ProgressRecord) -> Result<()> {
        fs::create_dir_all(&self.folder)
            .with_context(|| format!("creating temp folder {}", self.folder.display()))?;

        let path = self.progress_path(job_id);
        let tmp = path.with_extension(format!("{}.tmp", PROGRESS_EXTENSION));
        let json = serde_json::to_string_pretty(record)?;

        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;

        tracing::debug!(
            job = %job_id,
            last_token = %record.last_token_processed,
            remaining = record.remaining_token_count,
            "Saved progress"
        );
        Ok(())
    }

    /// Delete the progress record of a job; missing files are not an error
    pub fn clear(&self, job_id: &JobId) -> Result<()> {
        let path = self.progress_path(job_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(job = %job_id, "Cleared progress");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BurstError::State(format!(
                "Failed to delete progress file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// All progress records in the temp folder, sorted by job id
    ///
    /// Unreadable files are reported by the caller through the error list.
    pub fn list(&self) -> Result<(Vec<(JobId, ProgressRecord)>, Vec<(PathBuf, BurstError)>)> {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        let entries = match fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok((records, failures)),
            Err(e) => return Err(BurstError::from(e).with_context(self.folder.display())),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROGRESS_EXTENSION) {
                continue;
            }
            let Some(job_id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| JobId::new(s).ok())
            else {
                continue;
            };

            match self.load(&job_id) {
                Ok(Some(record)) => records.push((job_id, record)),
                Ok(None) => {}
                Err(e) => failures.push((path, e)),
            }
        }

        records.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        Ok((records, failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::progress::ProgressRecordBuilder;
    use tempfile::TempDir;

    fn tokens(values: &[&str]) -> Vec<Token> {
        values.iter().map(|v| Token::new(*v)).collect()
    }

    fn job() -> JobId {
        JobId::new("invoices").unwrap()
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = ResumptionStore::new(dir.path());
        assert!(store.load(&job()).unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = ResumptionStore::new(dir.path().join("temp"));
        let seq = tokens(&["a", "b", "c"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[1]).build();

        store.save(&job(), &record).unwrap();
        assert!(store.progress_path(&job()).exists());
        assert_eq!(store.load(&job()).unwrap(), Some(record));

        store.clear(&job()).unwrap();
        assert!(store.load(&job()).unwrap().is_none());
        // idempotent
        store.clear(&job()).unwrap();
    }

    #[test]
    fn test_unsupported_format_version_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ResumptionStore::new(dir.path());
        let seq = tokens(&["a", "b"]);
        let mut record = ProgressRecordBuilder::new("in.csv", &seq, &seq[0]).build();
        record.format_version = 99;
        store.save(&job(), &record).unwrap();

        let err = store.load(&job()).unwrap_err();
        assert!(matches!(err, BurstError::State(_)));
    }

    #[test]
    fn test_validate_accepts_same_sequence() {
        let seq = tokens(&["a", "b", "c"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[1]).build();
        assert!(ResumptionStore::validate(&record, &seq, -1).is_ok());
    }

    #[test]
    fn test_validate_detects_length_change() {
        let seq = tokens(&["a", "b", "c"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[1]).build();

        let err = ResumptionStore::validate(&record, &tokens(&["a", "b", "c", "d"]), -1).unwrap_err();
        match err {
            BurstError::ProgressMismatch { field, stored, actual, .. } => {
                assert_eq!(field, "token_count");
                assert_eq!(stored, "3");
                assert_eq!(actual, "4");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_validate_detects_different_last_token() {
        let seq = tokens(&["a", "b", "c"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[1]).build();

        let err = ResumptionStore::validate(&record, &tokens(&["a", "b", "x"]), -1).unwrap_err();
        assert!(matches!(
            err,
            BurstError::ProgressMismatch { field: "last_token_in_sequence", .. }
        ));
    }

    #[test]
    fn test_validate_detects_moved_token() {
        let seq = tokens(&["a", "b", "c"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[0]).build();

        let err = ResumptionStore::validate(&record, &tokens(&["b", "a", "c"]), -1).unwrap_err();
        assert!(matches!(
            err,
            BurstError::ProgressMismatch { field: "index_of_last_token_processed", .. }
        ));
    }

    #[test]
    fn test_validate_page_count_only_when_known() {
        let seq = tokens(&["a", "b"]);
        let record = ProgressRecordBuilder::new("in.pdf", &seq, &seq[0])
            .page_count(4)
            .build();

        assert!(ResumptionStore::validate(&record, &seq, -1).is_ok());
        assert!(ResumptionStore::validate(&record, &seq, 4).is_ok());
        assert!(matches!(
            ResumptionStore::validate(&record, &seq, 5).unwrap_err(),
            BurstError::ProgressMismatch { field: "page_count", .. }
        ));
    }

    #[test]
    fn test_is_already_processed() {
        let seq = tokens(&["a", "b", "c", "d"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[1]).build();

        assert!(ResumptionStore::is_already_processed(&record, &seq[0], &seq));
        assert!(ResumptionStore::is_already_processed(&record, &seq[1], &seq));
        assert!(!ResumptionStore::is_already_processed(&record, &seq[2], &seq));
        assert!(!ResumptionStore::is_already_processed(&record, &seq[3], &seq));
    }

    #[test]
    fn test_list_progress_files() {
        let dir = TempDir::new().unwrap();
        let store = ResumptionStore::new(dir.path());
        let seq = tokens(&["a", "b"]);
        let record = ProgressRecordBuilder::new("in.csv", &seq, &seq[0]).build();

        store.save(&JobId::new("zeta").unwrap(), &record).unwrap();
        store.save(&JobId::new("alpha").unwrap(), &record).unwrap();
        fs::write(dir.path().join("broken.progress"), "not json").unwrap();
        fs::write(dir.path().join("alpha.pause"), "").unwrap();

        let (records, failures) = store.list().unwrap();
        let names: Vec<&str> = records.iter().map(|(job, _)| job.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(failures.len(), 1);
    }
}
