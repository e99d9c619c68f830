//! In-process analysis store

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AnalysisStore, AnalysisUpdate, ContainerUpdate, StoreError};
use crate::model::{Analysis, Container, SecurityTest};
use crate::scanners::{ScannerQuery, ScannerRegistry};

/// Keeps analyses in memory and answers scanner queries from a registry.
///
/// Every operation takes the lock once, so each partial update is applied
/// atomically with respect to the others.
pub struct MemoryStore {
    analyses: Mutex<HashMap<String, Analysis>>,
    scanners: ScannerRegistry,
}

impl MemoryStore {
    pub fn new(scanners: ScannerRegistry) -> Self {
        Self {
            analyses: Mutex::new(HashMap::new()),
            scanners,
        }
    }

    pub fn scanners(&self) -> &ScannerRegistry {
        &self.scanners
    }

    fn with_analysis<T>(
        &self,
        rid: &str,
        f: impl FnOnce(&mut Analysis) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut analyses = self
            .analyses
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let analysis = analyses
            .get_mut(rid)
            .ok_or_else(|| StoreError::NotFound(format!("analysis {}", rid)))?;
        f(analysis)
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn insert_analysis(&self, analysis: Analysis) -> Result<(), StoreError> {
        let mut analyses = self
            .analyses
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if analyses.contains_key(&analysis.rid) {
            return Err(StoreError::Conflict(analysis.rid));
        }
        analyses.insert(analysis.rid.clone(), analysis);
        Ok(())
    }

    async fn find_analysis(&self, rid: &str) -> Result<Analysis, StoreError> {
        self.with_analysis(rid, |analysis| Ok(analysis.clone()))
    }

    async fn find_running(&self, url: &str, branch: &str) -> Result<Option<Analysis>, StoreError> {
        let analyses = self
            .analyses
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(analyses
            .values()
            .find(|a| a.url == url && a.branch == branch && a.is_running())
            .cloned())
    }

    async fn update_analysis(&self, rid: &str, update: AnalysisUpdate) -> Result<(), StoreError> {
        self.with_analysis(rid, |analysis| {
            update.apply(analysis);
            Ok(())
        })
    }

    async fn add_container(&self, rid: &str, container: Container) -> Result<bool, StoreError> {
        self.with_analysis(rid, |analysis| {
            if analysis.container_for(container.scanner()).is_some() {
                return Ok(false);
            }
            analysis.containers.push(container);
            Ok(true)
        })
    }

    async fn update_analysis_container(
        &self,
        rid: &str,
        cid: &str,
        update: ContainerUpdate,
    ) -> Result<(), StoreError> {
        self.with_analysis(rid, |analysis| {
            let container = analysis
                .containers
                .iter_mut()
                .find(|c| c.cid.as_deref() == Some(cid))
                .ok_or_else(|| StoreError::NotFound(format!("container {}", cid)))?;
            update.apply(container);
            Ok(())
        })
    }

    async fn find_scanners(&self, query: &ScannerQuery) -> Result<Vec<SecurityTest>, StoreError> {
        let found = self.scanners.query(query);
        if found.is_empty() {
            return Err(StoreError::NotFound(format!("scanners matching {:?}", query)));
        }
        Ok(found)
    }
}
