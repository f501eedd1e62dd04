//! License file reader

use crate::adapters::traits::LicenseService;
use crate::config::{LicenseConfig, SecretString};
use crate::domain::errors::BurstError;
use crate::domain::Result;
use chrono::{Local, NaiveDate};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LicenseStatus {
    Demo,
    Paid,
}

#[derive(Debug, Deserialize)]
struct LicenseFile {
    status: LicenseStatus,
    #[serde(default)]
    expires: Option<NaiveDate>,
    #[serde(default)]
    key: Option<String>,
}

/// License state read from a TOML license file
///
/// ```toml
/// status = "paid"
/// expires = "2027-01-31"
/// key = "..."
/// ```
///
/// No configured or existing file means demo. When both the file and the
/// configuration carry a key they must match.
#[derive(Debug, Clone)]
pub struct FileLicense {
    paid: bool,
    expired: bool,
    demo_limit: usize,
}

impl FileLicense {
    /// Demo license with the given per-run ceiling
    pub fn demo(demo_limit: usize) -> Self {
        Self {
            paid: false,
            expired: false,
            demo_limit,
        }
    }

    /// Load the license described by `config`
    ///
    /// # Errors
    ///
    /// Returns a `License` error if the file cannot be read or parsed, or if
    /// its key does not match the configured one.
    pub fn load(config: &LicenseConfig) -> Result<Self> {
        let Some(path) = config.path.as_deref() else {
            return Ok(Self::demo(config.demo_limit));
        };
        if !path.exists() {
            tracing::info!(license = %path.display(), "License file not found, running in demo mode");
            return Ok(Self::demo(config.demo_limit));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            BurstError::License(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents, path, config.key.as_ref(), config.demo_limit)
    }

    fn parse(
        contents: &str,
        path: &Path,
        configured_key: Option<&SecretString>,
        demo_limit: usize,
    ) -> Result<Self> {
        let file: LicenseFile = toml::from_str(contents).map_err(|e| {
            BurstError::License(format!("Invalid license file {}: {}", path.display(), e))
        })?;

        if let (Some(expected), Some(actual)) = (configured_key, file.key.as_deref()) {
            if !expected.expose_secret().matches(actual) {
                return Err(BurstError::License(format!(
                    "License key in {} does not match the configured key",
                    path.display()
                )));
            }
        }

        let expired = file
            .expires
            .map(|date| date < Local::now().date_naive())
            .unwrap_or(false);

        Ok(Self {
            paid: file.status == LicenseStatus::Paid,
            expired,
            demo_limit,
        })
    }
}

impl LicenseService for FileLicense {
    fn is_demo(&self) -> bool {
        !self.paid
    }

    fn is_paid(&self) -> bool {
        self.paid
    }

    fn is_expired(&self) -> bool {
        self.expired
    }

    fn limit(&self) -> usize {
        if self.is_paid() && !self.is_demo() {
            usize::MAX
        } else {
            self.demo_limit
        }
    }
}
