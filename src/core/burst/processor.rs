//! Per-token unit of work
//!
//! Extracts the token's artifact, collects and optionally archives its
//! attachments, then distributes it. Recipient failures are recovered here
//! (quarantine, hooks, counters); only I/O, template and extraction failures
//! and transport failures under fail-fast reach the caller.

use crate::adapters::archive::archive_attachments;
use crate::adapters::{
    Collaborators, Delivery, DistributionOutcome, ExtractRequest, ExtractScope, Sender,
};
use crate::config::{BurstConfig, RetryConfig};
use crate::core::qa::QA_FOLDER;
use crate::core::template;
use crate::domain::errors::BurstError;
use crate::domain::lifecycle::LifecyclePoint;
use crate::domain::run::RunContext;
use crate::domain::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Attachment template expanding to the artifacts of a prior split pass
pub const PRIOR_SPLIT_ATTACHMENTS: &str = "${extracted_file_paths_after_splitting_2nd_time}";

/// Suffix of the side-car file written by `dump_record_data`
pub const RECORD_DATA_SUFFIX: &str = "data.json";

/// Processes one token of a run
pub struct RecordProcessor<'a> {
    config: &'a BurstConfig,
    collaborators: &'a Collaborators,
    retry: RetryConfig,
}

impl<'a> RecordProcessor<'a> {
    pub fn new(config: &'a BurstConfig, collaborators: &'a Collaborators) -> Self {
        Self {
            config,
            collaborators,
            retry: RetryConfig::default(),
        }
    }

    /// Retry transport failures with this policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn should_distribute(&self) -> bool {
        !self.collaborators.senders.is_empty()
    }

    /// Process the current token of `ctx`
    ///
    /// `execute` is false for validation-only distribution (QA "test all").
    pub async fn process(
        &self,
        ctx: &mut RunContext,
        scope: ExtractScope,
        execute: bool,
    ) -> Result<()> {
        if ctx.requested_stop {
            return Ok(());
        }

        ctx.skip_current_distribution = ctx.skip_requested();

        self.extract(ctx, scope).await?;

        // a split-again pass only extracts; its artifacts are attached by the primary pass
        if self.config.secondary_split {
            return Ok(());
        }

        self.collect_attachments(ctx).await?;

        if self.should_distribute() {
            if ctx.skip_current_distribution {
                ctx.counters.skipped += 1;
                tracing::info!(token = %current_token(ctx), "Distribution skipped");
            } else {
                if let Some(delay) = self.distribution_delay()? {
                    tokio::time::sleep(delay).await;
                }
                self.distribute(ctx, execute).await?;
            }
        }

        Ok(())
    }

    fn distribution_delay(&self) -> Result<Option<Duration>> {
        let seconds = self.config.delay_each_distribution_by;
        if seconds == 0.0 {
            return Ok(None);
        }
        Duration::try_from_secs_f64(seconds)
            .map(Some)
            .map_err(|e| {
                BurstError::Configuration(format!(
                    "burst.delay_each_distribution_by {} is not a usable delay: {}",
                    seconds, e
                ))
            })
    }

    async fn extract(&self, ctx: &mut RunContext, scope: ExtractScope) -> Result<()> {
        let hooks = self.collaborators.hooks.clone();
        hooks.run(LifecyclePoint::BeforeTemplateProcessing, ctx).await?;
        hooks.run(LifecyclePoint::StartExtractDocument, ctx).await?;

        let vars = ctx.scope();
        let output_folder = resolve_folder("output_folder", &self.config.output_folder, &vars)?;
        let quarantine_folder =
            resolve_folder("quarantine_folder", &self.config.quarantine_folder, &vars)?;

        tokio::fs::create_dir_all(&output_folder).await.map_err(|e| {
            BurstError::Io(format!("Failed to create {}: {}", output_folder.display(), e))
        })?;
        if ctx.is_qa {
            tokio::fs::create_dir_all(output_folder.join(QA_FOLDER)).await?;
        }
        ctx.output_folder = Some(output_folder.clone());
        ctx.quarantine_folder = Some(quarantine_folder);

        let name = template::render(&self.config.output_name, &ctx.scope());
        if name.trim().is_empty() {
            return Err(BurstError::Configuration(format!(
                "output_name '{}' resolved to an empty file name",
                self.config.output_name
            )));
        }
        let target = output_folder.join(name.trim());
        ctx.extracted_file_path = Some(target.clone());

        if self.config.dump_record_data {
            self.dump_record_data(ctx, scope, &target).await?;
        }

        let vars = ctx.scope();
        let artifact = self
            .collaborators
            .extractor
            .extract(ExtractRequest {
                scope,
                records: &ctx.records,
                variables: &vars,
                target: &target,
            })
            .await?;

        ctx.extracted_file_path = Some(artifact.clone());
        ctx.counters.extracted += 1;

        hooks.run(LifecyclePoint::EndExtractDocument, ctx).await?;

        tracing::info!(
            token = %current_token(ctx),
            burst_index = ctx.burst_index,
            artifact = %artifact.display(),
            "Document extracted"
        );
        Ok(())
    }

    async fn dump_record_data(
        &self,
        ctx: &RunContext,
        scope: ExtractScope,
        target: &Path,
    ) -> Result<()> {
        let data = match scope {
            ExtractScope::Record(row) => ctx.records.record_as_json(row),
            ExtractScope::All => ctx.records.to_json(),
        };
        let mut name = target.as_os_str().to_owned();
        name.push(".");
        name.push(RECORD_DATA_SUFFIX);
        tokio::fs::write(PathBuf::from(name), serde_json::to_vec_pretty(&data)?).await?;
        Ok(())
    }

    async fn collect_attachments(&self, ctx: &mut RunContext) -> Result<()> {
        ctx.attachments.clear();
        ctx.archive_file_path = None;

        let vars = ctx.scope();
        for attachment in &self.config.attachments {
            if attachment.trim() == PRIOR_SPLIT_ATTACHMENTS {
                let split = ctx.current_split_artifacts();
                ctx.attachments.extend(split);
                continue;
            }
            let resolved = template::render(attachment, &vars);
            if !resolved.trim().is_empty() {
                ctx.attachments.push(PathBuf::from(resolved.trim()));
            }
        }

        if !self.config.archive_attachments || ctx.attachments.is_empty() {
            return Ok(());
        }

        let name = template::render(&self.config.archive_file_name, &vars);
        if name.trim().is_empty() {
            return Err(BurstError::ArchiveName(self.config.archive_file_name.clone()));
        }
        let output_folder = ctx.output_folder.clone().unwrap_or_default();
        let target = output_folder.join(name.trim());

        let files = ctx.attachments.clone();
        let archive = tokio::task::spawn_blocking(move || archive_attachments(&files, &target))
            .await
            .map_err(|e| BurstError::Io(format!("Archive task failed: {}", e)))??;

        tracing::debug!(token = %current_token(ctx), archive = %archive.display(), "Attachments archived");
        ctx.archive_file_path = Some(archive.clone());
        ctx.attachments = vec![archive];

        self.collaborators
            .hooks
            .clone()
            .run(LifecyclePoint::Archive, ctx)
            .await
    }

    async fn distribute(&self, ctx: &mut RunContext, execute: bool) -> Result<()> {
        let hooks = self.collaborators.hooks.clone();
        let token = ctx
            .current_token
            .clone()
            .ok_or_else(|| BurstError::State("No current token to distribute".to_string()))?;
        let artifact = ctx
            .extracted_file_path
            .clone()
            .ok_or_else(|| BurstError::State(format!("No artifact extracted for token '{}'", token)))?;
        let attachments = ctx.attachments.clone();
        let qa_folder = if ctx.is_qa {
            ctx.output_folder.as_ref().map(|f| f.join(QA_FOLDER))
        } else {
            None
        };

        let mut failure = None;
        for sender in &self.collaborators.senders {
            hooks.run(LifecyclePoint::StartDistributeDocument, ctx).await?;

            let variables = ctx.scope();
            let delivery = Delivery {
                token: &token,
                artifact: &artifact,
                attachments: &attachments,
                variables: &variables,
                qa_folder: qa_folder.as_deref(),
            };

            match self.send_with_retry(sender.as_ref(), &delivery, execute).await {
                Ok(DistributionOutcome::Delivered { messages }) => {
                    ctx.counters.messages_sent += messages;
                    ctx.counters.distributed += attachments.len();
                    hooks.run(LifecyclePoint::EndDistributeDocument, ctx).await?;
                }
                Ok(DistributionOutcome::Invalid(reason)) => {
                    failure = Some(format!("{}: {}", sender.destination(), reason));
                    break;
                }
                Err(e) if ctx.fail_fast => {
                    return Err(e.with_context(format!("{} for token '{}'", sender.destination(), token)));
                }
                Err(e) => {
                    failure = Some(format!("{}: {}", sender.destination(), e));
                    break;
                }
            }
        }

        match failure {
            None => {
                tracing::info!(token = %token, execute, "Document distributed");
                if self.config.delete_files {
                    if let Err(e) = tokio::fs::remove_file(&artifact).await {
                        tracing::error!(artifact = %artifact.display(), error = %e, "Failed to delete distributed document");
                    }
                }
                Ok(())
            }
            Some(reason) => self.handle_failure(ctx, &artifact, reason).await,
        }
    }

    async fn send_with_retry(
        &self,
        sender: &dyn Sender,
        delivery: &Delivery<'_>,
        execute: bool,
    ) -> Result<DistributionOutcome> {
        let mut attempt = 0;
        loop {
            match sender.send(delivery, execute).await {
                Err(e) if self.retry.enabled && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        token = %delivery.token,
                        destination = %sender.destination(),
                        attempt = attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying distribution after error"
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn handle_failure(&self, ctx: &mut RunContext, artifact: &Path, reason: String) -> Result<()> {
        let hooks = self.collaborators.hooks.clone();
        tracing::warn!(token = %current_token(ctx), reason = %reason, "Distribution failed");

        if self.config.quarantine_files {
            let folder = ctx.quarantine_folder.clone().unwrap_or_default();
            tokio::fs::create_dir_all(&folder).await?;
            let name = artifact.file_name().ok_or_else(|| {
                BurstError::Io(format!("Cannot quarantine '{}': no file name", artifact.display()))
            })?;
            let target = folder.join(name);
            tokio::fs::copy(artifact, &target).await.map_err(|e| {
                BurstError::Io(format!("Failed to quarantine {}: {}", artifact.display(), e))
            })?;
            ctx.counters.quarantined += 1;
            tracing::warn!(token = %current_token(ctx), quarantined = %target.display(), "Document quarantined");
            hooks.run(LifecyclePoint::QuarantineDocument, ctx).await?;
        }

        ctx.last_error = Some(reason);
        hooks
            .run(LifecyclePoint::DistributeReportErrorHandling, ctx)
            .await
    }
}

fn resolve_folder(
    setting: &str,
    folder_template: &str,
    vars: &std::collections::BTreeMap<String, String>,
) -> Result<PathBuf> {
    let resolved = template::render(folder_template, vars);
    if resolved.trim().is_empty() {
        return Err(BurstError::Configuration(format!(
            "burst.{} resolved to an empty path",
            setting
        )));
    }
    Ok(PathBuf::from(resolved.trim()))
}

fn current_token(ctx: &RunContext) -> String {
    ctx.current_token
        .as_ref()
        .map(|t| t.to_string())
        .unwrap_or_default()
}
