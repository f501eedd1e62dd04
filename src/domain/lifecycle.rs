//! Lifecycle points at which extension hooks run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named points of a run where a user hook may execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePoint {
    StartBursting,
    TransformFetchedData,
    BeforeTemplateProcessing,
    StartExtractDocument,
    EndExtractDocument,
    Archive,
    StartDistributeDocument,
    EndDistributeDocument,
    DistributeReportErrorHandling,
    QuarantineDocument,
    EndBursting,
}

impl LifecyclePoint {
    /// Every lifecycle point in execution order
    pub const ALL: [LifecyclePoint; 11] = [
        LifecyclePoint::StartBursting,
        LifecyclePoint::TransformFetchedData,
        LifecyclePoint::BeforeTemplateProcessing,
        LifecyclePoint::StartExtractDocument,
        LifecyclePoint::EndExtractDocument,
        LifecyclePoint::Archive,
        LifecyclePoint::StartDistributeDocument,
        LifecyclePoint::EndDistributeDocument,
        LifecyclePoint::DistributeReportErrorHandling,
        LifecyclePoint::QuarantineDocument,
        LifecyclePoint::EndBursting,
    ];

    /// Configuration key of this point
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePoint::StartBursting => "start_bursting",
            LifecyclePoint::TransformFetchedData => "transform_fetched_data",
            LifecyclePoint::BeforeTemplateProcessing => "before_template_processing",
            LifecyclePoint::StartExtractDocument => "start_extract_document",
            LifecyclePoint::EndExtractDocument => "end_extract_document",
            LifecyclePoint::Archive => "archive",
            LifecyclePoint::StartDistributeDocument => "start_distribute_document",
            LifecyclePoint::EndDistributeDocument => "end_distribute_document",
            LifecyclePoint::DistributeReportErrorHandling => "distribute_report_error_handling",
            LifecyclePoint::QuarantineDocument => "quarantine_document",
            LifecyclePoint::EndBursting => "end_bursting",
        }
    }
}

impl fmt::Display for LifecyclePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecyclePoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecyclePoint::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown lifecycle point '{}'", s))
    }
}
