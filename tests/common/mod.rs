//! Shared fixtures and collaborator doubles for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use burstline::adapters::license::FileLicense;
use burstline::adapters::{
    create_collaborators, Collaborators, Delivery, Destination, DistributionOutcome,
    ExtensionHooks, Sender,
};
use burstline::config::{BurstlineConfig, IdColumn};
use burstline::core::burst::{BurstEngine, BurstRequest, RunOutcome};
use burstline::core::control::{CancellationSignal, ControlRequest};
use burstline::core::state::ResumptionStore;
use burstline::domain::{BurstError, JobId, LifecyclePoint, Result, RunContext, Token};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Job id of the fixture input
pub const JOB: &str = "statements";

/// A CSV input with `n` rows `c1..cn`
pub fn statements_csv(n: usize) -> String {
    let mut csv = String::from("id,name,email,skip\n");
    for i in 1..=n {
        csv.push_str(&format!("c{i},Customer {i},c{i}@example.com,no\n"));
    }
    csv
}

/// Temp directory holding one input document and every run folder
pub struct Fixture {
    pub dir: TempDir,
    pub input: PathBuf,
}

impl Fixture {
    pub fn new(csv: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in").join(format!("{JOB}.csv"));
        fs::create_dir_all(input.parent().unwrap()).unwrap();
        fs::write(&input, csv).unwrap();
        Self { dir, input }
    }

    /// Replace the input document
    pub fn rewrite_input(&self, csv: &str) {
        fs::write(&self.input, csv).unwrap();
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn temp(&self) -> PathBuf {
        self.path("temp")
    }

    pub fn store(&self) -> ResumptionStore {
        ResumptionStore::new(self.temp())
    }

    pub fn job(&self) -> JobId {
        JobId::new(JOB).unwrap()
    }

    /// Configuration with every folder inside the fixture
    ///
    /// `run` names the statistics folder so consecutive runs never collide.
    pub fn config(&self, run: &str) -> BurstlineConfig {
        let mut config = BurstlineConfig::default();
        config.burst.output_folder = self.path("out").display().to_string();
        config.burst.quarantine_folder = self.path("quarantine").display().to_string();
        config.burst.backup_folder = self.path("backup").display().to_string();
        config.burst.logs_archives_folder = self.path("logs").join(run).display().to_string();
        config.datasource.id_column = IdColumn::Name("id".to_string());
        config.state.temp_folder = self.temp();
        config.logging.local_enabled = false;
        config
    }

    /// Artifact written for a token
    pub fn artifact(&self, token: &str) -> PathBuf {
        self.path("out").join(format!("{token}.json"))
    }

    /// Run one burst of the fixture input
    pub async fn burst(
        &self,
        config: BurstlineConfig,
        collaborators: Collaborators,
    ) -> Result<RunOutcome> {
        let engine = BurstEngine::new(config, collaborators, self.store());
        engine.burst(BurstRequest::new(&self.input)).await
    }

    /// Run one burst with a prepared request
    pub async fn burst_request(
        &self,
        config: BurstlineConfig,
        collaborators: Collaborators,
        request: BurstRequest,
    ) -> Result<RunOutcome> {
        let engine = BurstEngine::new(config, collaborators, self.store());
        engine.burst(request).await
    }
}

/// Collaborators built from `config` with the given senders, hooks and demo limit
pub fn collaborators(
    config: &BurstlineConfig,
    senders: Vec<Arc<dyn Sender>>,
    hooks: Arc<dyn ExtensionHooks>,
    limit: usize,
) -> Collaborators {
    let mut collaborators = create_collaborators(config).unwrap();
    collaborators.senders = senders;
    collaborators.hooks = hooks;
    collaborators.license = Arc::new(FileLicense::demo(limit));
    collaborators
}

/// Token names of `outcome.processed`
pub fn processed(outcome: &RunOutcome) -> Vec<String> {
    outcome.processed.iter().map(|t| t.to_string()).collect()
}

type Script = fn(&str) -> Result<DistributionOutcome>;

struct Sent {
    token: String,
    execute: bool,
    attachments: Vec<PathBuf>,
}

/// Sender recording every delivery and answering from a script
pub struct RecordingSender {
    script: Script,
    failures_left: AtomicUsize,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingSender {
    pub fn delivering() -> Arc<Self> {
        Self::scripted(|_| Ok(DistributionOutcome::Delivered { messages: 1 }))
    }

    pub fn scripted(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            failures_left: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Delivers, after failing the first `failures` sends at the transport level
    pub fn flaky(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            script: |_| Ok(DistributionOutcome::Delivered { messages: 1 }),
            failures_left: AtomicUsize::new(failures),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Tokens handed to the sender, in order
    pub fn tokens(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|s| s.token.clone()).collect()
    }

    /// `execute` flags of the deliveries, in order
    pub fn executed(&self) -> Vec<bool> {
        self.sent.lock().unwrap().iter().map(|s| s.execute).collect()
    }

    /// Attachments of each delivery, in order
    pub fn attachments(&self) -> Vec<Vec<PathBuf>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.attachments.clone())
            .collect()
    }
}

#[async_trait]
impl Sender for RecordingSender {
    fn destination(&self) -> Destination {
        Destination::Email
    }

    async fn send(&self, delivery: &Delivery<'_>, execute: bool) -> Result<DistributionOutcome> {
        self.sent.lock().unwrap().push(Sent {
            token: delivery.token.to_string(),
            execute,
            attachments: delivery.attachments.to_vec(),
        });
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BurstError::Distribution("connection reset".to_string()));
        }
        (self.script)(delivery.token.as_str())
    }
}

/// Hooks writing a pause or cancel marker once a given token was extracted
pub struct MarkerHooks {
    folder: PathBuf,
    job: JobId,
    token: Token,
    request: ControlRequest,
}

impl MarkerHooks {
    pub fn new(folder: &Path, job: JobId, token: &str, request: ControlRequest) -> Arc<Self> {
        Arc::new(Self {
            folder: folder.to_path_buf(),
            job,
            token: Token::new(token),
            request,
        })
    }
}

#[async_trait]
impl ExtensionHooks for MarkerHooks {
    async fn run(&self, point: LifecyclePoint, ctx: &mut RunContext) -> Result<()> {
        if point == LifecyclePoint::EndExtractDocument
            && ctx.current_token.as_ref() == Some(&self.token)
        {
            CancellationSignal::request(&self.folder, &self.job, self.request)?;
        }
        Ok(())
    }
}
