//! Built-in senders
//!
//! Mail, web and SMS deliveries are spooled as JSON envelopes into an outbox
//! folder that an external transport picks up. Uploads copy the artifact and
//! its attachments into the resolved folder. In QA mode every delivery lands
//! in the run's quality-assurance folder instead.

use crate::adapters::traits::{Delivery, Destination, DistributionOutcome, Sender};
use crate::core::template;
use crate::domain::errors::BurstError;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").expect("Invalid phone regex"))
}

/// Splits a recipient list on `,` and `;`
fn recipients(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn file_safe(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    destination: Destination,
    token: &'a str,
    recipients: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    artifact: &'a Path,
    attachments: &'a [PathBuf],
    created_at: String,
}

async fn spool(outbox: &Path, envelope: &Envelope<'_>) -> Result<PathBuf> {
    let folder = outbox.join(envelope.destination.as_str());
    tokio::fs::create_dir_all(&folder).await.map_err(|e| {
        BurstError::Distribution(format!("Failed to create outbox {}: {}", folder.display(), e))
    })?;

    let path = folder.join(format!(
        "{}-{}.json",
        Utc::now().format("%Y%m%dT%H%M%S%.3f"),
        file_safe(envelope.token)
    ));
    let bytes = serde_json::to_vec_pretty(envelope)?;
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        BurstError::Distribution(format!("Failed to spool {}: {}", path.display(), e))
    })?;
    Ok(path)
}

fn outbox_for(delivery: &Delivery<'_>, outbox: &Path) -> PathBuf {
    delivery
        .qa_folder
        .map(Path::to_path_buf)
        .unwrap_or_else(|| outbox.to_path_buf())
}

/// Spools e-mail envelopes
#[derive(Debug, Clone)]
pub struct MailSender {
    to: String,
    subject: String,
    outbox: PathBuf,
}

impl MailSender {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, outbox: impl Into<PathBuf>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            outbox: outbox.into(),
        }
    }
}

#[async_trait]
impl Sender for MailSender {
    fn destination(&self) -> Destination {
        Destination::Email
    }

    async fn send(&self, delivery: &Delivery<'_>, execute: bool) -> Result<DistributionOutcome> {
        let to = recipients(&template::render(&self.to, delivery.variables));
        if to.is_empty() {
            return Ok(DistributionOutcome::Invalid(format!(
                "No e-mail recipient for token '{}'",
                delivery.token
            )));
        }
        if let Some(bad) = to.iter().find(|a| !email_regex().is_match(a)) {
            return Ok(DistributionOutcome::Invalid(format!(
                "Invalid e-mail address '{}' for token '{}'",
                bad, delivery.token
            )));
        }
        if !execute {
            return Ok(DistributionOutcome::Delivered { messages: 0 });
        }

        let subject = template::render(&self.subject, delivery.variables);
        let path = spool(
            &outbox_for(delivery, &self.outbox),
            &Envelope {
                destination: Destination::Email,
                token: delivery.token.as_str(),
                recipients: &to,
                subject: Some(&subject),
                artifact: delivery.artifact,
                attachments: delivery.attachments,
                created_at: Utc::now().to_rfc3339(),
            },
        )
        .await?;

        tracing::info!(token = %delivery.token, recipients = to.len(), envelope = %path.display(), "E-mail spooled");
        Ok(DistributionOutcome::Delivered { messages: to.len() })
    }
}

/// Copies artifacts into a resolved upload folder
#[derive(Debug, Clone)]
pub struct UploadSender {
    folder: String,
}

impl UploadSender {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl Sender for UploadSender {
    fn destination(&self) -> Destination {
        Destination::Upload
    }

    async fn send(&self, delivery: &Delivery<'_>, execute: bool) -> Result<DistributionOutcome> {
        let resolved = template::render(&self.folder, delivery.variables);
        if resolved.trim().is_empty() {
            return Ok(DistributionOutcome::Invalid(format!(
                "Upload folder resolved empty for token '{}'",
                delivery.token
            )));
        }
        if !execute {
            return Ok(DistributionOutcome::Delivered { messages: 0 });
        }

        let target = match delivery.qa_folder {
            Some(qa) => qa.join(Destination::Upload.as_str()).join(file_safe(delivery.token.as_str())),
            None => PathBuf::from(resolved.trim()),
        };
        tokio::fs::create_dir_all(&target).await.map_err(|e| {
            BurstError::Distribution(format!("Failed to create {}: {}", target.display(), e))
        })?;

        let mut files = vec![delivery.artifact.to_path_buf()];
        files.extend(
            delivery
                .attachments
                .iter()
                .filter(|a| a.as_path() != delivery.artifact)
                .cloned(),
        );

        for file in &files {
            let name = file.file_name().ok_or_else(|| {
                BurstError::Distribution(format!("Cannot upload '{}': no file name", file.display()))
            })?;
            tokio::fs::copy(file, target.join(name)).await.map_err(|e| {
                BurstError::Distribution(format!("Failed to upload {}: {}", file.display(), e))
            })?;
        }

        tracing::info!(token = %delivery.token, folder = %target.display(), files = files.len(), "Artifact uploaded");
        Ok(DistributionOutcome::Delivered { messages: 1 })
    }
}

/// Spools web publication envelopes
#[derive(Debug, Clone)]
pub struct WebSender {
    url: String,
    outbox: PathBuf,
}

impl WebSender {
    pub fn new(url: impl Into<String>, outbox: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            outbox: outbox.into(),
        }
    }
}

#[async_trait]
impl Sender for WebSender {
    fn destination(&self) -> Destination {
        Destination::Web
    }

    async fn send(&self, delivery: &Delivery<'_>, execute: bool) -> Result<DistributionOutcome> {
        let resolved = template::render(&self.url, delivery.variables);
        let url = match url::Url::parse(resolved.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return Ok(DistributionOutcome::Invalid(format!(
                    "Unsupported URL scheme '{}' for token '{}'",
                    url.scheme(),
                    delivery.token
                )))
            }
            Err(e) => {
                return Ok(DistributionOutcome::Invalid(format!(
                    "Invalid URL '{}' for token '{}': {}",
                    resolved, delivery.token, e
                )))
            }
        };
        if !execute {
            return Ok(DistributionOutcome::Delivered { messages: 0 });
        }

        let to = vec![url.to_string()];
        let path = spool(
            &outbox_for(delivery, &self.outbox),
            &Envelope {
                destination: Destination::Web,
                token: delivery.token.as_str(),
                recipients: &to,
                subject: None,
                artifact: delivery.artifact,
                attachments: delivery.attachments,
                created_at: Utc::now().to_rfc3339(),
            },
        )
        .await?;

        tracing::info!(token = %delivery.token, url = %url, envelope = %path.display(), "Web publication spooled");
        Ok(DistributionOutcome::Delivered { messages: 1 })
    }
}

/// Spools SMS envelopes
#[derive(Debug, Clone)]
pub struct SmsSender {
    to: String,
    outbox: PathBuf,
}

impl SmsSender {
    pub fn new(to: impl Into<String>, outbox: impl Into<PathBuf>) -> Self {
        Self {
            to: to.into(),
            outbox: outbox.into(),
        }
    }
}

#[async_trait]
impl Sender for SmsSender {
    fn destination(&self) -> Destination {
        Destination::Sms
    }

    async fn send(&self, delivery: &Delivery<'_>, execute: bool) -> Result<DistributionOutcome> {
        let to = recipients(&template::render(&self.to, delivery.variables));
        if to.is_empty() {
            return Ok(DistributionOutcome::Invalid(format!(
                "No phone number for token '{}'",
                delivery.token
            )));
        }
        if let Some(bad) = to.iter().find(|n| !phone_regex().is_match(n)) {
            return Ok(DistributionOutcome::Invalid(format!(
                "Invalid phone number '{}' for token '{}'",
                bad, delivery.token
            )));
        }
        if !execute {
            return Ok(DistributionOutcome::Delivered { messages: 0 });
        }

        let path = spool(
            &outbox_for(delivery, &self.outbox),
            &Envelope {
                destination: Destination::Sms,
                token: delivery.token.as_str(),
                recipients: &to,
                subject: None,
                artifact: delivery.artifact,
                attachments: delivery.attachments,
                created_at: Utc::now().to_rfc3339(),
            },
        )
        .await?;

        tracing::info!(token = %delivery.token, recipients = to.len(), envelope = %path.display(), "SMS spooled");
        Ok(DistributionOutcome::Delivered { messages: to.len() })
    }
}
