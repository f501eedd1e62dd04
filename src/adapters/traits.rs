//! Collaborator traits
//!
//! This module defines the traits the burst engine drives: fetching records,
//! deriving tokens, extracting artifacts, distributing them, running hooks
//! and reading the license.

use crate::domain::ids::Token;
use crate::domain::lifecycle::LifecyclePoint;
use crate::domain::record::{RecordSet, TokenIndex};
use crate::domain::run::RunContext;
use crate::domain::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reads the ordered record sequence of a data source
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Fetch every record of `source` in order
    ///
    /// # Errors
    ///
    /// Returns a `DataSource` error if the source cannot be read or parsed.
    async fn fetch(&self, source: &Path) -> Result<RecordSet>;

    /// Release resources held for the run
    ///
    /// Called once when the run finalizes, whatever its outcome.
    async fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Derives the ordered burst tokens and their variables from fetched records
///
/// Implementations never fail: a token column that cannot be resolved falls
/// back to sequential numbering.
pub trait MetadataParser: Send + Sync {
    /// Derive the token index of `records`
    fn derive_tokens(&self, records: &RecordSet) -> TokenIndex;
}

/// What an extraction covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractScope {
    /// One record, by row
    Record(usize),
    /// The whole record set as one document
    All,
}

/// Input of one extraction
#[derive(Debug)]
pub struct ExtractRequest<'a> {
    pub scope: ExtractScope,
    pub records: &'a RecordSet,
    pub variables: &'a BTreeMap<String, String>,
    /// Path the artifact must be written to
    pub target: &'a Path,
}

/// Materializes one output artifact
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Write the artifact for `request` and return its path
    ///
    /// # Errors
    ///
    /// Extraction failures are fatal for the run.
    async fn extract(&self, request: ExtractRequest<'_>) -> Result<PathBuf>;
}

/// Distribution destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Email,
    Upload,
    Web,
    Sms,
}

impl Destination {
    /// Lower-case name of the destination
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Email => "email",
            Destination::Upload => "upload",
            Destination::Web => "web",
            Destination::Sms => "sms",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One artifact to hand to a sender
#[derive(Debug)]
pub struct Delivery<'a> {
    pub token: &'a Token,
    pub artifact: &'a Path,
    pub attachments: &'a [PathBuf],
    pub variables: &'a BTreeMap<String, String>,
    /// Set in QA mode: deliveries are written here instead of being sent
    pub qa_folder: Option<&'a Path>,
}

/// Result of a distribution attempt that did not fail at the transport level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionOutcome {
    /// The artifact was handed over as `messages` messages
    Delivered { messages: usize },
    /// The recipient is unusable (bad address, bad URL); the run continues
    Invalid(String),
}

/// Distributes artifacts to one destination
#[async_trait]
pub trait Sender: Send + Sync {
    /// Destination this sender serves
    fn destination(&self) -> Destination;

    /// Validate the recipient of `delivery` and, when `execute` is set, send it
    ///
    /// # Errors
    ///
    /// Returns a `Distribution` error for transport failures. A bad recipient
    /// is not an error but [`DistributionOutcome::Invalid`].
    async fn send(&self, delivery: &Delivery<'_>, execute: bool) -> Result<DistributionOutcome>;
}

/// User extension points of a run
#[async_trait]
pub trait ExtensionHooks: Send + Sync {
    /// Run the hook of `point`; a point without a hook is a no-op
    ///
    /// # Errors
    ///
    /// Returns a `Hook` error if the hook fails.
    async fn run(&self, point: LifecyclePoint, ctx: &mut RunContext) -> Result<()>;
}

/// Read-only license state
pub trait LicenseService: Send + Sync {
    /// Running without a license
    fn is_demo(&self) -> bool;

    /// The license was paid for
    fn is_paid(&self) -> bool;

    /// The license is past its expiry date
    fn is_expired(&self) -> bool;

    /// Tokens a run may process
    fn limit(&self) -> usize;
}
