//! Collaborators of the burst engine
//!
//! This module defines the collaborator traits and their built-in
//! implementations:
//!
//! - [`fetch`] - CSV/TSV, JSON and fixed-width data fetchers
//! - [`tokens`] - id-column token derivation
//! - [`extract`] - text template and JSON extractors
//! - [`senders`] - mail, upload, web and SMS senders
//! - [`archive`] - zip archive of attachments
//! - [`hooks`] - shell command lifecycle hooks
//! - [`license`] - license file reader
//! - [`factory`] - builds all of the above from configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use burstline::adapters::create_collaborators;
//! use burstline::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("burstline.toml")?;
//! let collaborators = create_collaborators(&config)?;
//! println!("{} senders", collaborators.senders.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod extract;
pub mod factory;
pub mod fetch;
pub mod hooks;
pub mod license;
pub mod senders;
pub mod tokens;
pub mod traits;

pub use factory::create_collaborators;
pub use traits::{
    DataFetcher, Delivery, Destination, DistributionOutcome, ExtensionHooks, ExtractRequest,
    ExtractScope, Extractor, LicenseService, MetadataParser, Sender,
};

use std::sync::Arc;

/// Everything a burst run delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn DataFetcher>,
    pub parser: Arc<dyn MetadataParser>,
    pub extractor: Arc<dyn Extractor>,
    /// Senders in distribution order; empty means no distribution
    pub senders: Vec<Arc<dyn Sender>>,
    pub hooks: Arc<dyn ExtensionHooks>,
    pub license: Arc<dyn LicenseService>,
}
