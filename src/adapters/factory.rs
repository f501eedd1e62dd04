//! Collaborator factory
//!
//! This module builds the built-in collaborators from configuration, with one
//! `match` per configured kind.

use crate::adapters::extract::{JsonRecordExtractor, TextTemplateExtractor};
use crate::adapters::fetch::{DelimitedFetcher, FixedWidthFetcher, JsonFetcher};
use crate::adapters::hooks::{CommandHooks, NoopHooks};
use crate::adapters::license::FileLicense;
use crate::adapters::senders::{MailSender, SmsSender, UploadSender, WebSender};
use crate::adapters::tokens::ColumnTokenParser;
use crate::adapters::traits::{
    DataFetcher, Destination, ExtensionHooks, Extractor, LicenseService, MetadataParser, Sender,
};
use crate::adapters::Collaborators;
use crate::config::{BurstlineConfig, DataSourceKind, DistributionConfig, OutputKind};
use crate::domain::Result;
use std::sync::Arc;

/// Create the data fetcher for the configured data source
///
/// # Errors
///
/// Returns a `Configuration` error if the delimiter or quote is not ASCII.
pub fn create_fetcher(kind: &DataSourceKind) -> Result<Arc<dyn DataFetcher>> {
    let fetcher: Arc<dyn DataFetcher> = match kind {
        DataSourceKind::Csv {
            delimiter,
            has_header,
            quote,
        } => Arc::new(DelimitedFetcher::new(*delimiter, *quote, *has_header)?),
        DataSourceKind::Tsv { has_header } => Arc::new(DelimitedFetcher::tsv(*has_header)),
        DataSourceKind::Json { records_pointer } => {
            Arc::new(JsonFetcher::new(records_pointer.clone()))
        }
        DataSourceKind::FixedWidth { widths, has_header } => {
            Arc::new(FixedWidthFetcher::new(widths.clone(), *has_header))
        }
    };
    Ok(fetcher)
}

/// Create the extractor for the configured output
pub fn create_extractor(kind: &OutputKind) -> Arc<dyn Extractor> {
    match kind {
        OutputKind::Text { template_path } => Arc::new(TextTemplateExtractor::new(template_path)),
        OutputKind::Json { pretty } => Arc::new(JsonRecordExtractor::new(*pretty)),
    }
}

/// Create the sender of one destination
pub fn create_sender(destination: Destination, config: &DistributionConfig) -> Arc<dyn Sender> {
    match destination {
        Destination::Email => Arc::new(MailSender::new(
            config.email_to.clone(),
            config.email_subject.clone(),
            config.outbox_folder.clone(),
        )),
        Destination::Upload => Arc::new(UploadSender::new(config.upload_folder.clone())),
        Destination::Web => Arc::new(WebSender::new(
            config.web_url.clone(),
            config.outbox_folder.clone(),
        )),
        Destination::Sms => Arc::new(SmsSender::new(
            config.sms_to.clone(),
            config.outbox_folder.clone(),
        )),
    }
}

/// Create a sender for every enabled destination, in a fixed order
pub fn create_senders(config: &DistributionConfig) -> Vec<Arc<dyn Sender>> {
    [
        (Destination::Email, config.email),
        (Destination::Upload, config.upload),
        (Destination::Web, config.web),
        (Destination::Sms, config.sms),
    ]
    .into_iter()
    .filter(|(_, enabled)| *enabled)
    .map(|(destination, _)| create_sender(destination, config))
    .collect()
}

/// Create every collaborator of a run from configuration
///
/// # Errors
///
/// Returns an error if the data source settings are unusable or the license
/// file cannot be loaded.
pub fn create_collaborators(config: &BurstlineConfig) -> Result<Collaborators> {
    let fetcher = create_fetcher(&config.datasource.format)?;
    let parser: Arc<dyn MetadataParser> =
        Arc::new(ColumnTokenParser::new(config.datasource.id_column.clone()));
    let extractor = create_extractor(&config.output.format);
    let senders = create_senders(&config.distribution);

    let hooks: Arc<dyn ExtensionHooks> = if config.hooks.is_empty() {
        Arc::new(NoopHooks)
    } else {
        Arc::new(CommandHooks::new(
            config.hooks.clone(),
            config.state.temp_folder.clone(),
        ))
    };

    let license: Arc<dyn LicenseService> = Arc::new(FileLicense::load(&config.license)?);

    tracing::info!(
        senders = senders.len(),
        hooks = !config.hooks.is_empty(),
        "Collaborators created"
    );

    Ok(Collaborators {
        fetcher,
        parser,
        extractor,
        senders,
        hooks,
        license,
    })
}
