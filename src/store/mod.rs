//! Analysis persistence
//!
//! Concurrent scan units never rewrite a whole Analysis. They issue partial
//! updates: one analysis-level [`AnalysisUpdate`], or a [`ContainerUpdate`]
//! targeted at a single container by its ID, so writers touching different
//! containers cannot clobber each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{
    Analysis, AnalysisStatus, Code, ConsolidatedResults, Container, ContainerStatus, ScanResult,
    SecurityTest,
};
use crate::scanners::ScannerQuery;

pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

/// Fields of an Analysis to overwrite; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisUpdate {
    pub status: Option<AnalysisStatus>,
    pub result: Option<ScanResult>,
    pub error_found: Option<String>,
    pub codes: Option<Vec<Code>>,
    pub commit_authors: Option<Vec<String>>,
    pub results: Option<ConsolidatedResults>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AnalysisUpdate {
    pub fn apply(self, analysis: &mut Analysis) {
        if let Some(status) = self.status {
            analysis.status = status;
        }
        if let Some(result) = self.result {
            analysis.result = Some(result);
        }
        if let Some(error_found) = self.error_found {
            analysis.error_found = error_found;
        }
        if let Some(codes) = self.codes {
            analysis.codes = codes;
        }
        if let Some(authors) = self.commit_authors {
            analysis.commit_authors = authors;
        }
        if let Some(results) = self.results {
            analysis.results = results;
        }
        if let Some(finished_at) = self.finished_at {
            analysis.finished_at = Some(finished_at);
        }
    }
}

/// Fields of one Container to overwrite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerUpdate {
    pub status: Option<ContainerStatus>,
    pub output: Option<String>,
    pub result: Option<ScanResult>,
    pub info: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ContainerUpdate {
    pub fn status(status: ContainerStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply(self, container: &mut Container) {
        if let Some(status) = self.status {
            container.status = status;
        }
        if let Some(output) = self.output {
            container.output = output;
        }
        if let Some(result) = self.result {
            container.result = Some(result);
        }
        if let Some(info) = self.info {
            container.info = info;
        }
        if let Some(started_at) = self.started_at {
            container.started_at = Some(started_at);
        }
        if let Some(finished_at) = self.finished_at {
            container.finished_at = Some(finished_at);
        }
    }
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Stores a new analysis; `Conflict` if the RID is taken
    async fn insert_analysis(&self, analysis: Analysis) -> Result<(), StoreError>;

    async fn find_analysis(&self, rid: &str) -> Result<Analysis, StoreError>;

    /// The analysis currently running for (URL, branch), if any
    async fn find_running(&self, url: &str, branch: &str) -> Result<Option<Analysis>, StoreError>;

    async fn update_analysis(&self, rid: &str, update: AnalysisUpdate) -> Result<(), StoreError>;

    /// Appends a container unless one for the same scanner is already recorded.
    /// Returns whether the container was added.
    async fn add_container(&self, rid: &str, container: Container) -> Result<bool, StoreError>;

    async fn update_analysis_container(
        &self,
        rid: &str,
        cid: &str,
        update: ContainerUpdate,
    ) -> Result<(), StoreError>;

    /// Scanner definitions matching `query`; `NotFound` when there are none
    async fn find_scanners(&self, query: &ScannerQuery) -> Result<Vec<SecurityTest>, StoreError>;
}
