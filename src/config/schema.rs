//! Configuration schema types
//!
//! This module defines the configuration structure for burstline. Every
//! section has defaults so a minimal file only needs the settings that
//! differ from them.

use crate::config::SecretString;
use crate::domain::LifecyclePoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main burstline configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurstlineConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Burst output and policy settings
    #[serde(default)]
    pub burst: BurstConfig,

    /// Where records come from and how tokens are derived
    #[serde(default)]
    pub datasource: DataSourceConfig,

    /// How each artifact is rendered
    #[serde(default)]
    pub output: OutputConfig,

    /// Destinations enabled for the run
    #[serde(default)]
    pub distribution: DistributionConfig,

    /// Lifecycle hook commands
    #[serde(default)]
    pub hooks: HooksConfig,

    /// License settings
    #[serde(default)]
    pub license: LicenseConfig,

    /// Marker and progress file location
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BurstlineConfig {
    /// Validates the configuration
    ///
    /// Blank output settings are not rejected here; the engine reports them
    /// as fatal configuration errors when a run starts.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.burst.validate()?;
        self.datasource.validate()?;
        self.output.validate()?;
        self.distribution.retry.validate()?;
        self.hooks.validate()?;
        self.license.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Burst output and policy configuration
///
/// Every folder and file name is a `${variable}` template resolved per token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstConfig {
    /// Name of this configuration, quoted in error messages
    #[serde(default = "default_template_name")]
    pub template_name: String,

    /// Burst file name template; without placeholders the run bursts a single document
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Output folder template
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Quarantine folder template (required when any distribution is enabled)
    #[serde(default = "default_quarantine_folder")]
    pub quarantine_folder: String,

    /// Folder the input document is backed up to at the end of a run
    #[serde(default = "default_backup_folder")]
    pub backup_folder: String,

    /// Folder receiving the statistics file; must be new for each run
    #[serde(default = "default_logs_archives_folder")]
    pub logs_archives_folder: String,

    /// Statistics file name template
    #[serde(default = "default_stats_file_name")]
    pub stats_file_name: String,

    /// Delete each artifact once distributed and skip the input backup
    #[serde(default)]
    pub delete_files: bool,

    /// Copy artifacts whose distribution failed to the quarantine folder
    #[serde(default = "default_true")]
    pub quarantine_files: bool,

    /// Abort the run on a transport failure (ignored in QA mode)
    #[serde(default = "default_true")]
    pub fail_job_if_any_distribution_fails: bool,

    /// Seconds to wait before each distribution
    #[serde(default)]
    pub delay_each_distribution_by: f64,

    /// Write each record as a `-record-data.json` side-car next to its artifact
    #[serde(default)]
    pub dump_record_data: bool,

    /// Bundle all attachments of a token into one zip archive
    #[serde(default)]
    pub archive_attachments: bool,

    /// Archive file name template
    #[serde(default = "default_archive_file_name")]
    pub archive_file_name: String,

    /// Attachment path templates
    #[serde(default = "default_attachments")]
    pub attachments: Vec<String>,

    /// Marks a split-again pass whose artifacts are attached by the parent run
    #[serde(default)]
    pub secondary_split: bool,
}

impl BurstConfig {
    fn validate(&self) -> Result<(), String> {
        if Duration::try_from_secs_f64(self.delay_each_distribution_by).is_err() {
            return Err(format!(
                "burst.delay_each_distribution_by must be a non-negative number of seconds, got {}",
                self.delay_each_distribution_by
            ));
        }

        if self.logs_archives_folder.trim().is_empty() {
            return Err("burst.logs_archives_folder cannot be empty".to_string());
        }

        if self.stats_file_name.trim().is_empty() {
            return Err("burst.stats_file_name cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            template_name: default_template_name(),
            output_name: default_output_name(),
            output_folder: default_output_folder(),
            quarantine_folder: default_quarantine_folder(),
            backup_folder: default_backup_folder(),
            logs_archives_folder: default_logs_archives_folder(),
            stats_file_name: default_stats_file_name(),
            delete_files: false,
            quarantine_files: true,
            fail_job_if_any_distribution_fails: true,
            delay_each_distribution_by: 0.0,
            dump_record_data: false,
            archive_attachments: false,
            archive_file_name: default_archive_file_name(),
            attachments: default_attachments(),
            secondary_split: false,
        }
    }
}

/// Data source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Column the burst token is read from
    #[serde(default)]
    pub id_column: IdColumn,

    /// Source format and its options
    #[serde(default)]
    pub format: DataSourceKind,
}

impl DataSourceConfig {
    fn validate(&self) -> Result<(), String> {
        if let DataSourceKind::FixedWidth { widths, .. } = &self.format {
            if widths.is_empty() || widths.contains(&0) {
                return Err(
                    "datasource.format.widths must list at least one non-zero column width"
                        .to_string(),
                );
            }
        }
        Ok(())
    }
}

/// Supported data source kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceKind {
    /// Delimited text
    Csv {
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default = "default_true")]
        has_header: bool,
        #[serde(default = "default_quote")]
        quote: char,
    },
    /// Tab separated text
    Tsv {
        #[serde(default = "default_true")]
        has_header: bool,
    },
    /// A JSON array of objects, optionally nested under a JSON pointer
    Json {
        #[serde(default)]
        records_pointer: Option<String>,
    },
    /// Fixed-width columns
    FixedWidth {
        widths: Vec<usize>,
        #[serde(default)]
        has_header: bool,
    },
}

impl Default for DataSourceKind {
    fn default() -> Self {
        DataSourceKind::Csv {
            delimiter: default_delimiter(),
            has_header: true,
            quote: default_quote(),
        }
    }
}

/// Which column holds the burst token
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdColumn {
    /// Tokens are the sequential record numbers
    #[default]
    NotUsed,
    /// Column at a zero-based position
    Index(usize),
    /// Column with this header name
    Name(String),
    /// First column
    First,
    /// Last column
    Last,
}

/// Output rendering configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Artifact file extension; defaults to the format's own
    #[serde(default)]
    pub extension: Option<String>,

    /// Output format and its options
    #[serde(default)]
    pub format: OutputKind,
}

impl OutputConfig {
    /// Extension exposed as `${output_type_extension}`
    pub fn extension(&self) -> String {
        match &self.extension {
            Some(ext) if !ext.trim().is_empty() => ext.trim_start_matches('.').to_string(),
            _ => match self.format {
                OutputKind::Text { .. } => "txt".to_string(),
                OutputKind::Json { .. } => "json".to_string(),
            },
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let OutputKind::Text { template_path } = &self.format {
            if template_path.as_os_str().is_empty() {
                return Err("output.format.template_path cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Supported output kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputKind {
    /// Render a `${variable}` text template
    Text { template_path: PathBuf },
    /// Write the record as JSON
    Json {
        #[serde(default = "default_true")]
        pretty: bool,
    },
}

impl Default for OutputKind {
    fn default() -> Self {
        OutputKind::Json { pretty: true }
    }
}

/// Distribution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Send each artifact by e-mail
    #[serde(default)]
    pub email: bool,

    /// Upload each artifact
    #[serde(default)]
    pub upload: bool,

    /// Publish each artifact to a web endpoint
    #[serde(default)]
    pub web: bool,

    /// Notify each recipient by SMS
    #[serde(default)]
    pub sms: bool,

    /// Recipient address template
    #[serde(default = "default_email_to")]
    pub email_to: String,

    /// Subject template
    #[serde(default = "default_email_subject")]
    pub email_subject: String,

    /// Upload folder template
    #[serde(default = "default_upload_folder")]
    pub upload_folder: String,

    /// Web endpoint template
    #[serde(default)]
    pub web_url: String,

    /// Phone number template
    #[serde(default = "default_sms_to")]
    pub sms_to: String,

    /// Folder delivery envelopes are spooled to
    #[serde(default = "default_outbox_folder")]
    pub outbox_folder: String,

    /// Retry policy for transport failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl DistributionConfig {
    /// Returns true when at least one destination is enabled
    pub fn any_enabled(&self) -> bool {
        self.email || self.upload || self.web || self.sms
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            email: false,
            upload: false,
            web: false,
            sms: false,
            email_to: default_email_to(),
            email_subject: default_email_subject(),
            upload_folder: default_upload_folder(),
            web_url: String::new(),
            sms_to: default_sms_to(),
            outbox_folder: default_outbox_folder(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retry sends that fail at the transport level
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(format!(
                "distribution.retry.backoff_multiplier must be at least 1.0, got {}",
                self.backoff_multiplier
            ));
        }

        if self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "distribution.retry.initial_delay_ms ({}) exceeds max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            ));
        }

        Ok(())
    }

    /// Backoff before retry number `attempt` (1-based), capped at `max_delay_ms`
    pub fn delay_for(&self, attempt: usize) -> Duration {
        if self.initial_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Lifecycle hook commands keyed by lifecycle point name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HooksConfig {
    pub commands: BTreeMap<String, String>,
}

impl HooksConfig {
    /// Command configured for a lifecycle point
    pub fn command_for(&self, point: LifecyclePoint) -> Option<&str> {
        self.commands
            .get(point.as_str())
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }

    /// Returns true when no hook command is configured
    pub fn is_empty(&self) -> bool {
        self.commands.values().all(|c| c.trim().is_empty())
    }

    fn validate(&self) -> Result<(), String> {
        for key in self.commands.keys() {
            key.parse::<LifecyclePoint>()
                .map_err(|e| format!("hooks: {}", e))?;
        }
        Ok(())
    }
}

/// License configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// License file; missing means demo
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// License key matched against the license file
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub key: Option<SecretString>,

    /// Records processed per run without a paid license
    #[serde(default = "default_demo_limit")]
    pub demo_limit: usize,
}

impl LicenseConfig {
    fn validate(&self) -> Result<(), String> {
        if self.demo_limit == 0 {
            return Err("license.demo_limit must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: None,
            demo_limit: default_demo_limit(),
        }
    }
}

/// Marker and progress file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Folder holding `<job>.pause`, `<job>.cancel` and `<job>.progress`
    #[serde(default = "default_temp_folder")]
    pub temp_folder: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            temp_folder: default_temp_folder(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log file directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_template_name() -> String {
    "default".to_string()
}

fn default_output_name() -> String {
    "${burst_token}.${output_type_extension}".to_string()
}

fn default_output_folder() -> String {
    "output/${input_document_name}/${now}".to_string()
}

fn default_quarantine_folder() -> String {
    "quarantine/${input_document_name}/${now}".to_string()
}

fn default_backup_folder() -> String {
    "backup/${input_document_name}/${now}".to_string()
}

fn default_logs_archives_folder() -> String {
    "logs/archives/${input_document_name}/${now}".to_string()
}

fn default_stats_file_name() -> String {
    "_${stats_info}.log".to_string()
}

fn default_archive_file_name() -> String {
    "reports-${burst_token}.zip".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_attachments() -> Vec<String> {
    vec!["${extracted_file_path}".to_string()]
}

fn default_delimiter() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

fn default_email_to() -> String {
    "${burst_token}".to_string()
}

fn default_email_subject() -> String {
    "${burst_token}".to_string()
}

fn default_upload_folder() -> String {
    "upload/${input_document_name}/${burst_token}".to_string()
}

fn default_sms_to() -> String {
    "${burst_token}".to_string()
}

fn default_outbox_folder() -> String {
    "outbox".to_string()
}

fn default_demo_limit() -> usize {
    25
}

fn default_temp_folder() -> PathBuf {
    PathBuf::from("temp")
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
