//! Run statistics and the statistics file
//!
//! This module defines the accounting summary of a run and writes it, once,
//! into a fresh logs-archive folder.

use crate::config::BurstlineConfig;
use crate::core::template;
use crate::domain::errors::BurstError;
use crate::domain::run::{RunContext, RunCounters};
use crate::domain::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Template of the `${stats_info}` variable
pub const STATS_INFO_TEMPLATE: &str =
    "${num_pages}pages-${num_files_extracted}extracted-${num_files_distributed}distributed";

/// Summary of a burst run
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Final counters of the run
    pub counters: RunCounters,

    /// Tokens of the run's (possibly QA-reduced) sequence
    pub tokens_read: usize,

    /// Pages of the input document, `-1` if it has none
    pub page_count: i64,

    /// Wall time of the run
    pub duration: Duration,

    /// Statistics file, when it was written
    pub stats_file: Option<PathBuf>,
}

impl RunStatistics {
    /// Snapshot the counters of `ctx`
    pub fn from_context(ctx: &RunContext, duration: Duration) -> Self {
        Self {
            counters: ctx.counters.clone(),
            tokens_read: ctx.tokens.len(),
            page_count: ctx.page_count(),
            duration,
            stats_file: None,
        }
    }

    /// Statistics template variables, `stats_info` included
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("num_pages".to_string(), self.page_count.to_string());
        vars.insert("num_tokens".to_string(), self.tokens_read.to_string());
        vars.insert(
            "num_files_extracted".to_string(),
            self.counters.extracted.to_string(),
        );
        vars.insert(
            "num_messages_sent".to_string(),
            self.counters.messages_sent.to_string(),
        );
        vars.insert(
            "num_files_distributed".to_string(),
            self.counters.distributed.to_string(),
        );
        vars.insert(
            "num_files_skipped_distribution".to_string(),
            self.counters.skipped.to_string(),
        );
        vars.insert(
            "num_files_quarantined".to_string(),
            self.counters.quarantined.to_string(),
        );
        let info = template::render(STATS_INFO_TEMPLATE, &vars);
        vars.insert("stats_info".to_string(), info);
        vars
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            tokens = self.tokens_read,
            pages = self.page_count,
            extracted = self.counters.extracted,
            messages_sent = self.counters.messages_sent,
            distributed = self.counters.distributed,
            skipped = self.counters.skipped,
            quarantined = self.counters.quarantined,
            duration_ms = self.duration.as_millis() as u64,
            "Burst completed"
        );

        if self.counters.quarantined > 0 {
            tracing::warn!(
                quarantined = self.counters.quarantined,
                "Some documents were quarantined"
            );
        }
    }
}

/// `HH:MM:SS.mmm` rendering of a duration
pub fn format_elapsed(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        duration.subsec_millis()
    )
}

/// Writes the statistics file of a run
#[derive(Debug)]
pub struct StatisticsReporter<'a> {
    config: &'a BurstlineConfig,
}

impl<'a> StatisticsReporter<'a> {
    pub fn new(config: &'a BurstlineConfig) -> Self {
        Self { config }
    }

    /// Human-readable report of a run
    pub fn render(&self, ctx: &RunContext, stats: &RunStatistics) -> String {
        let distribution = &self.config.distribution;
        let mut report = String::new();

        let _ = writeln!(report, "Input Document = {}", ctx.source_path.display());
        let _ = writeln!(report, "Execution Time = {}", format_elapsed(stats.duration));
        if stats.page_count > -1 {
            let _ = writeln!(report, "Number Of Pages = {}", stats.page_count);
        }
        let _ = writeln!(report, "Tokens Read = {}", stats.tokens_read);
        let _ = writeln!(report, "Documents Extracted = {}", stats.counters.extracted);
        let _ = writeln!(report, "Messages Sent = {}", stats.counters.messages_sent);
        let _ = writeln!(report, "Documents Distributed = {}", stats.counters.distributed);
        if stats.counters.skipped > 0 {
            let _ = writeln!(report, "Skipped = {}", stats.counters.skipped);
        }
        if stats.counters.quarantined > 0 {
            let _ = writeln!(report, "Quarantined = {}", stats.counters.quarantined);
        }
        let _ = writeln!(report, "Output Folder = {}", display(&ctx.output_folder));
        let _ = writeln!(report, "Quarantine Folder = {}", display(&ctx.quarantine_folder));
        let _ = writeln!(report, "sendfiles.email = {}", distribution.email);
        let _ = writeln!(report, "sendfiles.upload = {}", distribution.upload);
        let _ = writeln!(report, "sendfiles.web = {}", distribution.web);
        let _ = writeln!(report, "sendfiles.sms = {}", distribution.sms);
        let _ = writeln!(
            report,
            "failjobifanydistributionfails = {}",
            self.config.burst.fail_job_if_any_distribution_fails
        );
        report
    }

    /// Write the statistics file into a new logs-archive folder
    ///
    /// The statistics variables are published into `ctx.globals` first so
    /// the folder and file name templates can use them.
    ///
    /// # Errors
    ///
    /// Returns [`BurstError::StatisticsFolderExists`] if the resolved folder
    /// already exists, and I/O errors otherwise.
    pub fn write(&self, ctx: &mut RunContext, stats: &RunStatistics) -> Result<PathBuf> {
        ctx.globals.extend(stats.variables());
        let scope = ctx.scope();

        let folder = PathBuf::from(template::render(
            &self.config.burst.logs_archives_folder,
            &scope,
        ));
        if let Some(parent) = folder.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir(&folder).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                BurstError::StatisticsFolderExists(folder.display().to_string())
            }
            _ => BurstError::from(e),
        })?;
        ctx.logs_archives_folder = Some(folder.clone());

        let name = template::render(&self.config.burst.stats_file_name, &scope);
        let path = folder.join(name.trim());

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(self.render(ctx, stats).as_bytes())?;

        tracing::info!(stats_file = %path.display(), "Statistics written");
        Ok(path)
    }
}

fn display(path: &Option<PathBuf>) -> String {
    path.as_deref().map(Path::display).map(|d| d.to_string()).unwrap_or_default()
}
