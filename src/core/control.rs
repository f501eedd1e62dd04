//! Pause and cancel requests through sentinel marker files
//!
//! A running burst and the process asking it to stop are usually different
//! processes, so requests travel as `<job>.pause` / `<job>.cancel` files in
//! the temp folder. Markers are level-triggered: whoever observes one deletes
//! it, otherwise it would stop every future run of the job.

use crate::core::state::ResumptionStore;
use crate::domain::context::ResultExt;
use crate::domain::ids::JobId;
use crate::domain::Result;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A stop request observed through a marker file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlRequest {
    /// Stop at the next token boundary and keep progress for a later resume
    Pause,
    /// Stop at the next token boundary and discard progress
    Cancel,
}

impl ControlRequest {
    /// Marker file extension of this request
    pub fn extension(&self) -> &'static str {
        match self {
            ControlRequest::Pause => "pause",
            ControlRequest::Cancel => "cancel",
        }
    }

    /// Marker file of this request for a job
    pub fn marker_path(&self, folder: &Path, job_id: &JobId) -> PathBuf {
        folder.join(format!("{}.{}", job_id.as_str(), self.extension()))
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Polls the pause and cancel markers of one job
///
/// Once a request has been observed the signal stays raised for the rest of
/// the run; later polls do not touch the filesystem.
#[derive(Debug)]
pub struct CancellationSignal {
    job_id: JobId,
    store: ResumptionStore,
    observed: Option<ControlRequest>,
}

impl CancellationSignal {
    /// Create a signal for `job_id` watching the store's temp folder
    pub fn new(job_id: JobId, store: ResumptionStore) -> Self {
        Self {
            job_id,
            store,
            observed: None,
        }
    }

    /// Create the marker file requesting `request` for a job
    ///
    /// Used by the `pause`/`cancel` commands and by the Ctrl+C handler.
    pub fn request(folder: &Path, job_id: &JobId, request: ControlRequest) -> Result<PathBuf> {
        fs::create_dir_all(folder)
            .with_context(|| format!("creating temp folder {}", folder.display()))?;
        let path = request.marker_path(folder, job_id);
        fs::write(&path, b"").with_context(|| format!("writing marker {}", path.display()))?;
        Ok(path)
    }

    /// Returns true once a pause or cancel has been requested
    ///
    /// A pause marker is consumed. A cancel marker is consumed and the job's
    /// progress record is deleted so the next run starts over. With neither
    /// present the previous answer is returned unchanged.
    pub fn check_requested(&mut self) -> bool {
        if self.observed.is_some() {
            return true;
        }

        let folder = self.store.folder().to_path_buf();

        let pause = ControlRequest::Pause.marker_path(&folder, &self.job_id);
        if pause.exists() {
            tracing::info!(job = %self.job_id, "User requested PAUSE");
            remove_marker(&pause);
            self.observed = Some(ControlRequest::Pause);
            return true;
        }

        let cancel = ControlRequest::Cancel.marker_path(&folder, &self.job_id);
        if cancel.exists() {
            tracing::info!(job = %self.job_id, "User requested CANCEL");
            remove_marker(&cancel);
            if let Err(e) = self.store.clear(&self.job_id) {
                tracing::error!(job = %self.job_id, error = %e, "Failed to delete progress after cancel");
            }
            self.observed = Some(ControlRequest::Cancel);
            return true;
        }

        false
    }

    /// The request that stopped the run, if any
    pub fn observed(&self) -> Option<ControlRequest> {
        self.observed
    }
}

fn remove_marker(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::error!(marker = %path.display(), error = %e, "Failed to delete marker file");
    }
}
