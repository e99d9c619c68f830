//! Request intake
//!
//! Validates a (repository URL, branch) pair, refuses a second running analysis
//! for the same pair, and launches the coordinator in the background.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{CoordinatorError, IntakeError};
use super::orchestrator::FanOutCoordinator;
use super::unit::ScanRequest;
use crate::model::Analysis;
use crate::store::AnalysisStore;

const REPOSITORY_URL_PATTERN: &str =
    r"((git|ssh|http(s)?)|((git@|gitlab@)[\w.]+))(:(//)?)([\w.@:/\-~]+)(\.git)(/)?";
const BRANCH_PATTERN: &str = r"^[a-zA-Z0-9_/.-]*$";

fn repository_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(REPOSITORY_URL_PATTERN).expect("valid regex"))
}

fn branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BRANCH_PATTERN).expect("valid regex"))
}

/// Extracts the git repository URL from `url`, dropping anything around it
pub fn sanitize_repository_url(url: &str) -> Result<String, IntakeError> {
    repository_url_regex()
        .find(url)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| IntakeError::InvalidUrl(url.to_string()))
}

pub fn validate_branch(branch: &str) -> Result<(), IntakeError> {
    if branch.is_empty() || !branch_regex().is_match(branch) {
        return Err(IntakeError::InvalidBranch(branch.to_string()));
    }
    Ok(())
}

/// An accepted request and the task finalizing it
pub struct Submission {
    pub rid: String,
    pub handle: JoinHandle<Result<Analysis, CoordinatorError>>,
}

pub struct AnalysisService {
    coordinator: FanOutCoordinator,
    store: Arc<dyn AnalysisStore>,
    admission: Mutex<()>,
}

impl AnalysisService {
    pub fn new(coordinator: FanOutCoordinator) -> Self {
        let store = Arc::clone(coordinator.unit().store());
        Self {
            coordinator,
            store,
            admission: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Accepts a scan request and returns its RID without waiting for the scan
    pub async fn submit(&self, url: &str, branch: &str) -> Result<Submission, IntakeError> {
        let url = sanitize_repository_url(url)?;
        validate_branch(branch)?;

        // Check and insert under one lock so two submissions cannot both pass
        let _admitted = self.admission.lock().await;
        if let Some(running) = self.store.find_running(&url, branch).await? {
            warn!(url = %url, branch, rid = %running.rid, "Analysis already running");
            return Err(IntakeError::AlreadyRunning { rid: running.rid });
        }

        let rid = Uuid::new_v4().to_string();
        self.store
            .insert_analysis(Analysis::new(rid.clone(), url.clone(), branch))
            .await?;
        info!(rid = %rid, url = %url, branch, "Analysis accepted");

        let coordinator = self.coordinator.clone();
        let request = ScanRequest::new(rid.clone(), url, branch);
        let handle = tokio::spawn(async move { coordinator.run(request).await });

        Ok(Submission { rid, handle })
    }
}
