//! Burst engine - the run state machine
//!
//! A run fetches the records of one input, derives its tokens, picks single
//! or multi-record mode and processes tokens in order. Pause and cancel are
//! sampled at token boundaries only, progress is saved after every token but
//! the last, and finalization (resource release, input backup, end hook and
//! statistics) always runs.

use crate::adapters::{Collaborators, ExtractScope};
use crate::config::BurstlineConfig;
use crate::core::burst::processor::RecordProcessor;
use crate::core::burst::summary::{RunStatistics, StatisticsReporter};
use crate::core::control::{CancellationSignal, ControlRequest};
use crate::core::license::LicenseGate;
use crate::core::qa::{self, QaRequest, QA_TEST_NAME};
use crate::core::state::{ProgressRecord, ProgressRecordBuilder, ResumptionStore};
use crate::core::template;
use crate::domain::errors::BurstError;
use crate::domain::ids::{JobId, Token};
use crate::domain::lifecycle::LifecyclePoint;
use crate::domain::record::TokenIndex;
use crate::domain::run::RunContext;
use crate::domain::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Input of one burst run
#[derive(Debug, Clone, Default)]
pub struct BurstRequest {
    /// Input document
    pub source: PathBuf,

    /// Job the run belongs to; derived from the input file stem if unset
    pub job_id: Option<JobId>,

    /// Configuration file, recorded in progress records for `resume`
    pub config_path: Option<PathBuf>,

    /// Quality-assurance parameters
    pub qa: QaRequest,

    /// Artifacts of a split-again pass, attached through
    /// `${extracted_file_paths_after_splitting_2nd_time}`
    pub prior_split_artifacts: BTreeMap<Token, Vec<PathBuf>>,
}

impl BurstRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Set the job id
    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Set the configuration path
    pub fn with_config_path(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    /// Set the QA parameters
    pub fn with_qa(mut self, qa: QaRequest) -> Self {
        self.qa = qa;
        self
    }

    /// Attach the artifacts a split-again pass produced, grouped by token
    pub fn with_prior_split_artifacts(
        mut self,
        artifacts: impl IntoIterator<Item = (Token, PathBuf)>,
    ) -> Self {
        for (token, path) in artifacts {
            self.prior_split_artifacts.entry(token).or_default().push(path);
        }
        self
    }

    /// Rebuild the request a progress record was written by
    pub fn from_progress(job_id: JobId, record: &ProgressRecord) -> Self {
        Self {
            source: record.source_file_path.clone(),
            job_id: Some(job_id),
            config_path: record.config_path.clone(),
            qa: QaRequest {
                test_all: record.test_all,
                test_tokens: QaRequest::parse_token_list(&record.explicit_test_tokens),
                random_count: record.random_test_token_count,
            },
            prior_split_artifacts: BTreeMap::new(),
        }
    }
}

/// How a run processed its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// The whole record set as one document
    SingleRecord,
    /// One document per token
    MultiRecord,
    /// Nothing was fetched
    Empty,
}

/// Why a run stopped iterating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    Paused,
    Cancelled,
    LicenseLimit,
}

impl StopReason {
    /// Returns true if tokens were left unprocessed
    pub fn is_early(&self) -> bool {
        !matches!(self, StopReason::Completed)
    }
}

/// Result of a burst run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub job_id: JobId,
    pub mode: RunMode,
    pub stop_reason: StopReason,
    /// Tokens processed by this run, in order; fast-forwarded tokens excluded
    pub processed: Vec<Token>,
    /// Documents extracted by this run, in processing order
    pub artifacts: Vec<(Token, PathBuf)>,
    pub statistics: RunStatistics,
}

#[derive(Debug)]
struct Progress {
    mode: RunMode,
    stop_reason: StopReason,
    processed: Vec<Token>,
    artifacts: Vec<(Token, PathBuf)>,
}

/// Orchestrates burst runs
///
/// # Example
///
/// ```rust,no_run
/// use burstline::adapters::create_collaborators;
/// use burstline::config::load_config;
/// use burstline::core::burst::{BurstEngine, BurstRequest};
/// use burstline::core::state::ResumptionStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config("burstline.toml")?;
/// let collaborators = create_collaborators(&config)?;
/// let store = ResumptionStore::new(&config.state.temp_folder);
///
/// let engine = BurstEngine::new(config, collaborators, store);
/// let outcome = engine.burst(BurstRequest::new("invoices.csv")).await?;
/// println!("Processed {} tokens", outcome.processed.len());
/// # Ok(())
/// # }
/// ```
pub struct BurstEngine {
    config: BurstlineConfig,
    collaborators: Collaborators,
    store: ResumptionStore,
}

impl BurstEngine {
    pub fn new(config: BurstlineConfig, collaborators: Collaborators, store: ResumptionStore) -> Self {
        Self {
            config,
            collaborators,
            store,
        }
    }

    /// The resumption store of this engine
    pub fn store(&self) -> &ResumptionStore {
        &self.store
    }

    /// Execute one burst run
    ///
    /// # Errors
    ///
    /// Returns fatal configuration errors (zero tokens, progress drift, bad
    /// QA list, unresolvable archive name, statistics folder collision) and
    /// collaborator failures. Recipient failures never surface here; they are
    /// reflected in the statistics.
    pub async fn burst(&self, request: BurstRequest) -> Result<RunOutcome> {
        let started = Instant::now();

        let job_id = match request.job_id.clone() {
            Some(job_id) => job_id,
            None => JobId::from_input_path(&request.source).map_err(BurstError::InvalidArgument)?,
        };

        let mut ctx = RunContext::new(job_id.clone(), &request.source);
        ctx.config_path = request.config_path.clone();
        ctx.output_type_extension = self.config.output.extension();
        ctx.fail_fast = self.config.burst.fail_job_if_any_distribution_fails;
        ctx.prior_split_artifacts = request.prior_split_artifacts.clone();

        crate::log_burst_start!(&job_id, request.source);

        let mut signal = CancellationSignal::new(job_id.clone(), self.store.clone());
        let gate = LicenseGate::from_service(self.collaborators.license.as_ref());

        let result = self.run(&mut ctx, &request.qa, &mut signal, &gate).await;
        let finalized = self.finalize(&mut ctx, started).await;

        match (result, finalized) {
            (Ok(progress), Ok(statistics)) => {
                tracing::info!(
                    job = %job_id,
                    mode = ?progress.mode,
                    stop_reason = ?progress.stop_reason,
                    processed = progress.processed.len(),
                    "Burst finished"
                );
                Ok(RunOutcome {
                    job_id,
                    mode: progress.mode,
                    stop_reason: progress.stop_reason,
                    processed: progress.processed,
                    artifacts: progress.artifacts,
                    statistics,
                })
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), finalized) => {
                if let Err(fe) = finalized {
                    tracing::error!(job = %job_id, error = %fe, "Finalization failed after an aborted run");
                }
                tracing::error!(job = %job_id, error = %e, "Burst aborted");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext,
        qa_request: &QaRequest,
        signal: &mut CancellationSignal,
        gate: &LicenseGate,
    ) -> Result<Progress> {
        let hooks = self.collaborators.hooks.clone();
        hooks.run(LifecyclePoint::StartBursting, ctx).await?;

        ctx.records = self.collaborators.fetcher.fetch(&ctx.source_path).await?;
        hooks.run(LifecyclePoint::TransformFetchedData, ctx).await?;
        ctx.token_index = self.collaborators.parser.derive_tokens(&ctx.records);

        tracing::info!(
            records = ctx.records.len(),
            tokens = ctx.token_index.len(),
            "Data fetched"
        );

        ctx.requested_stop = signal.check_requested();

        if ctx.records.is_empty() {
            tracing::warn!(source = %ctx.source_path.display(), "No records fetched, nothing to burst");
            return Ok(Progress {
                mode: RunMode::Empty,
                stop_reason: stop_reason(signal, false),
                processed: Vec::new(),
                artifacts: Vec::new(),
            });
        }

        if !template::has_placeholders(&self.config.burst.output_name) {
            return self.run_single(ctx, signal).await;
        }

        self.run_multi(ctx, qa_request, signal, gate).await
    }

    async fn run_single(&self, ctx: &mut RunContext, signal: &CancellationSignal) -> Result<Progress> {
        tracing::info!(records = ctx.records.len(), "Single record mode");

        if ctx.requested_stop {
            return Ok(Progress {
                mode: RunMode::SingleRecord,
                stop_reason: stop_reason(signal, false),
                processed: Vec::new(),
                artifacts: Vec::new(),
            });
        }

        let token = Token::single_record();
        let mut variables = BTreeMap::new();
        variables.insert("burst_token".to_string(), token.to_string());
        variables.insert("row_index".to_string(), "0".to_string());
        variables.insert("row_number".to_string(), "1".to_string());

        let mut index = TokenIndex::new();
        index.push(token.clone(), 0, variables);
        ctx.token_index = index;
        ctx.tokens = vec![token.clone()];
        ctx.current_token = Some(token.clone());
        ctx.burst_index = 1;

        self.processor()
            .process(ctx, ExtractScope::All, true)
            .await?;
        let artifacts = ctx
            .extracted_file_path
            .clone()
            .map(|path| vec![(token.clone(), path)])
            .unwrap_or_default();

        self.after_loop(ctx).await;

        Ok(Progress {
            mode: RunMode::SingleRecord,
            stop_reason: StopReason::Completed,
            processed: vec![token],
            artifacts,
        })
    }

    async fn run_multi(
        &self,
        ctx: &mut RunContext,
        qa_request: &QaRequest,
        signal: &mut CancellationSignal,
        gate: &LicenseGate,
    ) -> Result<Progress> {
        if ctx.token_index.is_empty() {
            return Err(BurstError::NoTokens(ctx.source_path.display().to_string()));
        }

        let selection = qa::select(
            ctx.token_index.tokens().to_vec(),
            qa_request,
            &ctx.input_document_name(),
            &mut rand::thread_rng(),
        )?;
        ctx.tokens = selection.tokens;
        ctx.is_qa = selection.is_qa;
        if ctx.is_qa {
            ctx.qa_test_name = QA_TEST_NAME.to_string();
            ctx.fail_fast = false;
        }
        let execute = !(ctx.is_qa && qa_request.test_all);

        tracing::info!(
            tokens = ctx.tokens.len(),
            qa = ctx.is_qa,
            fail_fast = ctx.fail_fast,
            "Multi record mode"
        );

        let job_id = ctx.job_id.clone();
        let prior = self.store.load(&job_id)?;
        if let Some(record) = &prior {
            ResumptionStore::validate(record, &ctx.tokens, ctx.page_count())?;
            tracing::info!(
                job = %job_id,
                last_token = %record.last_token_processed,
                remaining = record.remaining_token_count,
                "Resuming from saved progress"
            );
        }

        let tokens = ctx.tokens.clone();
        if tokens.is_empty() {
            return Err(BurstError::NoTokens(ctx.source_path.display().to_string()));
        }
        let processor = self.processor();
        let last = tokens.len() - 1;
        let mut keep_going = !ctx.requested_stop;
        let mut license_hit = false;
        let mut done = 0usize;
        let mut processed = Vec::new();
        let mut artifacts = Vec::new();

        for (position, token) in tokens.iter().enumerate() {
            if !keep_going {
                break;
            }

            ctx.current_token = Some(token.clone());
            ctx.burst_index = done + 1;

            let fast_forward = prior
                .as_ref()
                .map(|record| ResumptionStore::is_already_processed(record, token, &tokens))
                .unwrap_or(false);

            if fast_forward {
                tracing::debug!(token = %token, "Already processed, skipping");
            } else {
                let row = ctx.current_row().ok_or_else(|| {
                    BurstError::State(format!("Token '{}' has no record", token))
                })?;
                processor
                    .process(ctx, ExtractScope::Record(row), execute)
                    .await?;
                processed.push(token.clone());
                if let Some(path) = &ctx.extracted_file_path {
                    artifacts.push((token.clone(), path.clone()));
                }

                if position == last {
                    self.store.clear(&job_id)?;
                } else {
                    self.store.save(&job_id, &self.progress_record(ctx, qa_request, token))?;
                }
            }

            done += 1;
            ctx.requested_stop = signal.check_requested();
            license_hit = gate.exceeded(done) && position < last;
            keep_going = !ctx.requested_stop && !gate.exceeded(done);
        }

        if license_hit && !ctx.requested_stop {
            tracing::warn!(
                limit = gate.limit(),
                remaining = tokens.len() - done,
                "License limit reached - the run stopped early, resume once the license allows more records"
            );
        }

        self.after_loop(ctx).await;

        let stop_reason = if done == tokens.len() {
            StopReason::Completed
        } else {
            stop_reason(signal, license_hit)
        };

        Ok(Progress {
            mode: RunMode::MultiRecord,
            stop_reason,
            processed,
            artifacts,
        })
    }

    fn processor(&self) -> RecordProcessor<'_> {
        RecordProcessor::new(&self.config.burst, &self.collaborators)
            .with_retry(self.config.distribution.retry.clone())
    }

    fn progress_record(&self, ctx: &RunContext, qa_request: &QaRequest, token: &Token) -> ProgressRecord {
        ProgressRecordBuilder::new(&ctx.source_path, &ctx.tokens, token)
            .config_path(ctx.config_path.clone())
            .page_count(ctx.page_count())
            .quality_assurance(
                qa_request.test_all,
                qa_request.token_list(),
                qa_request.random_count,
            )
            .build()
    }

    async fn after_loop(&self, ctx: &mut RunContext) {
        if self.config.burst.delete_files {
            if let Some(copy) = self.backup_path(ctx) {
                if copy.exists() {
                    if let Err(e) = tokio::fs::remove_file(&copy).await {
                        tracing::error!(backup = %copy.display(), error = %e, "Failed to delete input backup");
                    }
                }
            }
        }
        ctx.current_token = None;
        ctx.extracted_file_path = None;
    }

    fn backup_path(&self, ctx: &RunContext) -> Option<PathBuf> {
        let folder = template::render(&self.config.burst.backup_folder, &ctx.scope());
        if folder.trim().is_empty() {
            return None;
        }
        let name = ctx.source_path.file_name()?;
        Some(Path::new(folder.trim()).join(name))
    }

    async fn backup_input(&self, ctx: &mut RunContext) -> Result<()> {
        let Some(copy) = self.backup_path(ctx) else {
            return Ok(());
        };
        if let Some(folder) = copy.parent() {
            tokio::fs::create_dir_all(folder).await?;
            ctx.backup_folder = Some(folder.to_path_buf());
        }
        if !copy.exists() && ctx.source_path.exists() {
            tokio::fs::copy(&ctx.source_path, &copy).await?;
            tracing::debug!(backup = %copy.display(), "Input backed up");
        }
        Ok(())
    }

    async fn finalize(&self, ctx: &mut RunContext, started: Instant) -> Result<RunStatistics> {
        if let Err(e) = self.collaborators.fetcher.release().await {
            tracing::error!(error = %e, "Failed to release data source");
        }

        if !self.config.burst.delete_files {
            if let Err(e) = self.backup_input(ctx).await {
                tracing::error!(source = %ctx.source_path.display(), error = %e, "Failed to back up input");
            }
        }

        if let Err(e) = self
            .collaborators
            .hooks
            .run(LifecyclePoint::EndBursting, ctx)
            .await
        {
            tracing::error!(error = %e, "end_bursting hook failed");
        }

        let mut statistics = RunStatistics::from_context(ctx, started.elapsed());
        match StatisticsReporter::new(&self.config).write(ctx, &statistics) {
            Ok(path) => statistics.stats_file = Some(path),
            Err(e @ BurstError::StatisticsFolderExists(_)) => {
                statistics.log_summary();
                return Err(e);
            }
            Err(e) => tracing::error!(error = %e, "Failed to write statistics"),
        }

        statistics.log_summary();
        Ok(statistics)
    }
}

fn stop_reason(signal: &CancellationSignal, license_hit: bool) -> StopReason {
    match signal.observed() {
        Some(ControlRequest::Pause) => StopReason::Paused,
        Some(ControlRequest::Cancel) => StopReason::Cancelled,
        None if license_hit => StopReason::LicenseLimit,
        None => StopReason::Completed,
    }
}
