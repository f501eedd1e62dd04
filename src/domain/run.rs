//! Single-run state owned by the burst engine

use crate::domain::ids::{JobId, Token};
use crate::domain::record::{RecordSet, TokenIndex};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Format of the `${now}` variable
pub const NOW_FORMAT: &str = "%Y.%m.%d_%H.%M.%S%.3f";

/// Name of the per-token variable that suppresses distribution
pub const SKIP_VARIABLE: &str = "skip";

/// Accounting counters of one run
///
/// Counters only ever grow during a run; they are reset by creating a new
/// [`RunContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    /// Artifacts materialized by the extractor
    pub extracted: usize,
    /// Messages handed to senders
    pub messages_sent: usize,
    /// Attachments handed over, counted once per accepting sender
    pub distributed: usize,
    /// Artifacts whose distribution was skipped by the `skip` variable
    pub skipped: usize,
    /// Artifacts copied to quarantine after a failed distribution
    pub quarantined: usize,
}

/// Mutable state of one `burst` invocation
///
/// Created at the start of a run and dropped at its end. Nothing in here is
/// shared across runs or threads.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub job_id: JobId,
    pub source_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub started_at: DateTime<Local>,
    pub output_type_extension: String,

    pub records: RecordSet,
    pub token_index: TokenIndex,
    /// Token sequence of the run, fixed once tokens are selected
    pub tokens: Vec<Token>,
    pub current_token: Option<Token>,
    /// 1-based position of the current token in the run
    pub burst_index: usize,

    pub counters: RunCounters,
    pub skip_current_distribution: bool,
    pub is_qa: bool,
    pub qa_test_name: String,
    /// Transport failures abort the run when set; cleared in QA mode
    pub fail_fast: bool,
    /// Last recoverable distribution failure, visible to hooks
    pub last_error: Option<String>,
    pub requested_stop: bool,

    pub output_folder: Option<PathBuf>,
    pub quarantine_folder: Option<PathBuf>,
    pub backup_folder: Option<PathBuf>,
    pub logs_archives_folder: Option<PathBuf>,
    pub archive_file_path: Option<PathBuf>,
    pub extracted_file_path: Option<PathBuf>,
    pub attachments: Vec<PathBuf>,
    /// Artifacts of a prior split-again pass, per token
    pub prior_split_artifacts: BTreeMap<Token, Vec<PathBuf>>,

    /// Run-level variables set late in the run (statistics)
    pub globals: BTreeMap<String, String>,
}

impl RunContext {
    /// Creates the context of a run over `source_path`
    pub fn new(job_id: JobId, source_path: impl Into<PathBuf>) -> Self {
        Self {
            job_id,
            source_path: source_path.into(),
            config_path: None,
            started_at: Local::now(),
            output_type_extension: String::new(),
            records: RecordSet::default(),
            token_index: TokenIndex::default(),
            tokens: Vec::new(),
            current_token: None,
            burst_index: 0,
            counters: RunCounters::default(),
            skip_current_distribution: false,
            is_qa: false,
            qa_test_name: String::new(),
            fail_fast: true,
            last_error: None,
            requested_stop: false,
            output_folder: None,
            quarantine_folder: None,
            backup_folder: None,
            logs_archives_folder: None,
            archive_file_path: None,
            extracted_file_path: None,
            attachments: Vec::new(),
            prior_split_artifacts: BTreeMap::new(),
            globals: BTreeMap::new(),
        }
    }

    /// File name of the input document, e.g. `invoices.csv`
    pub fn input_document_name(&self) -> String {
        file_name(&self.source_path)
    }

    /// Extension of the input document without the dot
    pub fn input_document_extension(&self) -> String {
        self.source_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// `${now}` rendering of the run start time
    pub fn now(&self) -> String {
        self.started_at.format(NOW_FORMAT).to_string()
    }

    /// Page count of the source, `-1` if the source has no pages
    pub fn page_count(&self) -> i64 {
        self.records.page_count()
    }

    /// User variables of the current token
    pub fn user_variables(&self) -> Option<&BTreeMap<String, String>> {
        self.current_token
            .as_ref()
            .and_then(|t| self.token_index.variables_of(t))
    }

    /// Whether the current token's `skip` variable is truthy
    pub fn skip_requested(&self) -> bool {
        self.user_variables()
            .and_then(|vars| vars.get(SKIP_VARIABLE))
            .map(|v| is_truthy(v))
            .unwrap_or(false)
    }

    /// Row of the record set the current token was derived from
    pub fn current_row(&self) -> Option<usize> {
        self.current_token
            .as_ref()
            .and_then(|t| self.token_index.row_of(t))
    }

    /// Split-again artifacts of the current token that exist on disk
    pub fn current_split_artifacts(&self) -> Vec<PathBuf> {
        self.current_token
            .as_ref()
            .and_then(|t| self.prior_split_artifacts.get(t))
            .map(|paths| paths.iter().filter(|p| p.exists()).cloned().collect())
            .unwrap_or_default()
    }

    /// Variable scope for template resolution at this point of the run
    ///
    /// The current token's user variables come first; built-in variables
    /// take precedence over user variables of the same name.
    pub fn scope(&self) -> BTreeMap<String, String> {
        let mut scope = self.user_variables().cloned().unwrap_or_default();

        scope.extend(self.globals.clone());
        scope.insert("input_document_name".to_string(), self.input_document_name());
        scope.insert(
            "input_document_extension".to_string(),
            self.input_document_extension(),
        );
        scope.insert(
            "output_type_extension".to_string(),
            self.output_type_extension.clone(),
        );
        scope.insert("now".to_string(), self.now());
        scope.insert(
            "burst_token".to_string(),
            self.current_token
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_default(),
        );
        scope.insert("burst_index".to_string(), self.burst_index.to_string());
        scope.insert("output_folder".to_string(), display(&self.output_folder));
        scope.insert(
            "quarantine_folder".to_string(),
            display(&self.quarantine_folder),
        );
        scope.insert(
            "extracted_file_path".to_string(),
            display(&self.extracted_file_path),
        );
        scope.insert(
            "extracted_file_paths_after_splitting_2nd_time".to_string(),
            self.current_split_artifacts()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        scope
    }
}

/// Truthiness of a `skip`-style variable
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn display(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use test_case::test_case;

    fn context() -> RunContext {
        let mut ctx = RunContext::new(JobId::new("invoices").unwrap(), "/in/invoices.csv");
        ctx.records = RecordSet::new(
            vec!["id".to_string(), "skip".to_string()],
            vec![Record::new(vec!["7".to_string(), "yes".to_string()])],
        );
        let mut vars = ctx.records.record_variables(0);
        vars.insert("burst_token".to_string(), "shadowed".to_string());
        ctx.token_index.push(Token::new("7"), 0, vars);
        ctx
    }

    #[test]
    fn test_input_document_names() {
        let ctx = context();
        assert_eq!(ctx.input_document_name(), "invoices.csv");
        assert_eq!(ctx.input_document_extension(), "csv");
    }

    #[test]
    fn test_scope_builtins_win_over_user_variables() {
        let mut ctx = context();
        ctx.current_token = Some(Token::new("7"));
        ctx.burst_index = 1;

        let scope = ctx.scope();
        assert_eq!(scope["burst_token"], "7");
        assert_eq!(scope["burst_index"], "1");
        assert_eq!(scope["id"], "7");
        assert_eq!(scope["output_folder"], "");
    }

    #[test]
    fn test_split_artifacts_follow_current_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let detail = dir.path().join("7-detail.json");
        std::fs::write(&detail, "{}").unwrap();

        let mut ctx = context();
        ctx.prior_split_artifacts.insert(
            Token::new("7"),
            vec![detail.clone(), dir.path().join("missing.json")],
        );
        ctx.prior_split_artifacts
            .insert(Token::new("8"), vec![dir.path().join("8-detail.json")]);
        assert!(ctx.current_split_artifacts().is_empty());

        ctx.current_token = Some(Token::new("7"));
        assert_eq!(ctx.current_split_artifacts(), vec![detail.clone()]);
        assert_eq!(
            ctx.scope()["extracted_file_paths_after_splitting_2nd_time"],
            detail.display().to_string()
        );
    }

    #[test]
    fn test_skip_requested_reads_current_token() {
        let mut ctx = context();
        assert!(!ctx.skip_requested());
        ctx.current_token = Some(Token::new("7"));
        assert!(ctx.skip_requested());
    }

    #[test_case("true", true)]
    #[test_case("YES", true)]
    #[test_case(" 1 ", true)]
    #[test_case("false", false)]
    #[test_case("", false)]
    #[test_case("no", false)]
    fn test_is_truthy(value: &str, expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }
}
