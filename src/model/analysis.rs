use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::security_test::SecurityTest;
use super::status::{AnalysisStatus, ContainerStatus, ScanResult};
use super::vulnerability::ConsolidatedResults;

/// Files of one language found in the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub language: String,
    pub files: Vec<String>,
}

/// Execution record of one scanner run inside an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Assigned by the engine once creation succeeds
    #[serde(rename = "CID", default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,

    #[serde(rename = "securityTest")]
    pub security_test: SecurityTest,

    #[serde(rename = "cStatus")]
    pub status: ContainerStatus,

    #[serde(rename = "cOutput", default)]
    pub output: String,

    #[serde(rename = "cResult", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,

    #[serde(rename = "cInfo", default)]
    pub info: String,

    #[serde(rename = "startedAt", default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(rename = "finishedAt", default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Container {
    pub fn new(security_test: SecurityTest) -> Self {
        Self {
            cid: None,
            security_test,
            status: ContainerStatus::Created,
            output: String::new(),
            result: None,
            info: String::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn scanner(&self) -> &str {
        &self.security_test.name
    }

    /// Language group the container's findings count towards
    pub fn language(&self) -> &str {
        &self.security_test.language
    }
}

/// One scan request and everything learned while running it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(rename = "RID")]
    pub rid: String,

    #[serde(rename = "repositoryURL")]
    pub url: String,

    #[serde(rename = "repositoryBranch")]
    pub branch: String,

    pub status: AnalysisStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,

    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(rename = "errorFound", default)]
    pub error_found: String,

    #[serde(default)]
    pub codes: Vec<Code>,

    #[serde(rename = "commitAuthors", default)]
    pub commit_authors: Vec<String>,

    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,

    #[serde(rename = "finishedAt", default)]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub results: ConsolidatedResults,
}

impl Analysis {
    /// A freshly accepted request, already marked running
    pub fn new(rid: impl Into<String>, url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            rid: rid.into(),
            url: url.into(),
            branch: branch.into(),
            status: AnalysisStatus::Running,
            result: None,
            containers: Vec::new(),
            error_found: String::new(),
            codes: Vec::new(),
            commit_authors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            results: ConsolidatedResults::default(),
        }
    }

    pub fn container_for(&self, scanner: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.scanner() == scanner)
    }

    pub fn container_by_cid(&self, cid: &str) -> Option<&Container> {
        self.containers
            .iter()
            .find(|c| c.cid.as_deref() == Some(cid))
    }

    pub fn is_running(&self) -> bool {
        self.status == AnalysisStatus::Running
    }
}
