use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one scanner container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    #[default]
    Created,
    Running,
    Finished,
    Error,
}

/// Coarse classification of one scanner run (CResult)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanResult {
    Passed,
    Failed,
    Warning,
    Error,
}

/// Lifecycle of a whole analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnalysisStatus {
    #[default]
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "error running")]
    ErrorRunning,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Finished => "finished",
            ContainerStatus::Error => "error",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanResult::Passed => "passed",
            ScanResult::Failed => "failed",
            ScanResult::Warning => "warning",
            ScanResult::Error => "error",
        };
        f.write_str(s)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisStatus::Created => "created",
            AnalysisStatus::Running => "running",
            AnalysisStatus::Finished => "finished",
            AnalysisStatus::ErrorRunning => "error running",
        };
        f.write_str(s)
    }
}
