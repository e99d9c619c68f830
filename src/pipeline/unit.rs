//! Scan execution unit
//!
//! Runs one scanner for one analysis: pull, create, start, wait, read, parse.
//! Every step records its effect on the analysis through container-scoped
//! partial updates, and the container is removed whatever happened.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::error::ScanError;
use crate::analyzers::{AnalyzerError, AnalyzerRegistry, OutputAnalyzer, ScanOutcome};
use crate::model::{Container, ContainerStatus, ScanResult, SecurityTest};
use crate::runtime::RuntimeAdapter;
use crate::store::{AnalysisStore, ContainerUpdate};
use crate::util::text::render_command;

pub const INFO_PULL_FAILED: &str = "Error pulling scanner image.";
pub const INFO_CREATE_FAILED: &str = "Error creating the container.";
pub const INFO_START_FAILED: &str = "Error starting the container.";
pub const INFO_WAIT_FAILED: &str = "Error waiting the container to finish.";
pub const INFO_READ_FAILED: &str = "Error reading the container output.";

/// The repository an analysis scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub rid: String,
    pub url: String,
    pub branch: String,
}

impl ScanRequest {
    pub fn new(rid: impl Into<String>, url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            rid: rid.into(),
            url: url.into(),
            branch: branch.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    ImagePulled,
    Created,
    Started,
    Waited,
    OutputRead,
    Parsed,
    Finalized,
    Errored,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Pending => "pending",
            UnitState::ImagePulled => "image-pulled",
            UnitState::Created => "created",
            UnitState::Started => "started",
            UnitState::Waited => "waited",
            UnitState::OutputRead => "output-read",
            UnitState::Parsed => "parsed",
            UnitState::Finalized => "finalized",
            UnitState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// What one unit produced
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub scanner: String,
    pub tool: String,
    /// Language group used when consolidating findings
    pub language: String,
    pub cid: Option<String>,
    pub state: UnitState,
    pub result: Option<ScanResult>,
    pub outcome: Option<ScanOutcome>,
    /// The analysis already had a container for this scanner
    pub duplicate: bool,
}

impl UnitReport {
    fn new(test: &SecurityTest, analyzer: &dyn OutputAnalyzer) -> Self {
        Self {
            scanner: test.name.clone(),
            tool: analyzer.tool().to_string(),
            language: analyzer.language().to_string(),
            cid: None,
            state: UnitState::Pending,
            result: None,
            outcome: None,
            duplicate: false,
        }
    }

    fn advance(&mut self, rid: &str, to: UnitState) {
        debug!(rid, scanner = %self.scanner, from = %self.state, to = %to, "Scan unit transition");
        self.state = to;
    }
}

/// Everything a scan unit needs, cheap to clone into spawned tasks
#[derive(Clone)]
pub struct ScanUnit {
    runtime: RuntimeAdapter,
    analyzers: Arc<AnalyzerRegistry>,
    store: Arc<dyn AnalysisStore>,
    registry_url: String,
    ssh_key: String,
}

impl ScanUnit {
    pub fn new(
        runtime: RuntimeAdapter,
        analyzers: Arc<AnalyzerRegistry>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            runtime,
            analyzers,
            store,
            registry_url: String::new(),
            ssh_key: String::new(),
        }
    }

    /// Registry prefix for image pulls; empty pulls the bare `image:tag`
    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry_url = registry_url.into();
        self
    }

    pub fn with_ssh_key(mut self, ssh_key: impl Into<String>) -> Self {
        self.ssh_key = ssh_key.into();
        self
    }

    pub fn runtime(&self) -> &RuntimeAdapter {
        &self.runtime
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    pub fn analyzers(&self) -> &Arc<AnalyzerRegistry> {
        &self.analyzers
    }

    /// Runs `test` once for the analysis identified by `request.rid`.
    ///
    /// Scanner-level outcomes (findings, timeouts, tool-reported failures) come
    /// back as `Ok` with the classification on the report. `Err` means no result
    /// could be determined for this scanner.
    pub async fn run(&self, request: &ScanRequest, test: &SecurityTest) -> Result<UnitReport, ScanError> {
        let rid = request.rid.as_str();
        let scanner = test.name.as_str();

        let analyzer = self
            .analyzers
            .get(scanner)
            .ok_or_else(|| AnalyzerError::UnknownScanner(scanner.to_string()))?;
        let mut report = UnitReport::new(test, analyzer.as_ref());

        let cmd = render_command(&test.command, &request.url, &request.branch, &self.ssh_key);
        if cmd.is_empty() {
            return Err(ScanError::EmptyCommand(scanner.to_string()));
        }

        if self.store.find_analysis(rid).await?.container_for(scanner).is_some() {
            debug!(rid, scanner, "Container already recorded, skipping");
            report.duplicate = true;
            report.advance(rid, UnitState::Finalized);
            return Ok(report);
        }

        let image = test.canonical_reference(&self.registry_url);
        info!(rid, scanner, image = %image, "Starting scan unit");

        if let Err(e) = self.runtime.pull_with_retry(&image).await {
            error!(rid, scanner, error = %e, "Image pull failed");
            report.advance(rid, UnitState::Errored);
            self.record_failed_container(rid, test, INFO_PULL_FAILED).await?;
            return Err(e.into());
        }
        report.advance(rid, UnitState::ImagePulled);

        let cid = match self.runtime.create_container(&image, &cmd).await {
            Ok(cid) => cid,
            Err(e) => {
                error!(rid, scanner, error = %e, "Container create failed");
                report.advance(rid, UnitState::Errored);
                self.record_failed_container(rid, test, INFO_CREATE_FAILED).await?;
                return Err(e.into());
            }
        };
        report.cid = Some(cid.clone());

        let result = self
            .drive(rid, test, analyzer.as_ref(), &cid, &mut report)
            .await;

        self.runtime.cleanup(&cid).await;
        self.runtime.record_completion().await;

        if let Err(e) = &result {
            report.advance(rid, UnitState::Errored);
            error!(rid, scanner, cid = %cid, error = %e, "Scan unit failed");
        } else {
            info!(
                rid,
                scanner,
                cid = %cid,
                result = ?report.result,
                "Scan unit finished"
            );
        }
        result.map(|()| report)
    }

    /// Steps that run once the container exists
    async fn drive(
        &self,
        rid: &str,
        test: &SecurityTest,
        analyzer: &dyn OutputAnalyzer,
        cid: &str,
        report: &mut UnitReport,
    ) -> Result<(), ScanError> {
        let mut container = Container::new(test.clone());
        container.cid = Some(cid.to_string());
        if !self.store.add_container(rid, container).await? {
            debug!(rid, scanner = %test.name, cid, "Lost race for scanner container, discarding");
            report.duplicate = true;
            report.advance(rid, UnitState::Finalized);
            return Ok(());
        }
        report.advance(rid, UnitState::Created);

        if let Err(e) = self.runtime.start_with_retry(cid).await {
            self.store
                .update_analysis_container(rid, cid, errored(INFO_START_FAILED))
                .await?;
            return Err(e.into());
        }
        self.store
            .update_analysis_container(
                rid,
                cid,
                ContainerUpdate {
                    status: Some(ContainerStatus::Running),
                    started_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        report.advance(rid, UnitState::Started);

        if let Err(e) = self.runtime.wait_with_deadline(cid, test.timeout_secs).await {
            if e.is_wait_failure() {
                warn!(rid, scanner = %test.name, cid, error = %e, "Container wait failed");
            } else {
                error!(rid, scanner = %test.name, cid, error = %e, "Container wait failed");
            }
            self.store
                .update_analysis_container(
                    rid,
                    cid,
                    ContainerUpdate {
                        status: Some(ContainerStatus::Finished),
                        result: Some(ScanResult::Failed),
                        info: Some(INFO_WAIT_FAILED.to_string()),
                        finished_at: Some(Utc::now()),
                        ..Default::default()
                    },
                )
                .await?;
            report.result = Some(ScanResult::Failed);
            report.advance(rid, UnitState::Finalized);
            return Ok(());
        }
        report.advance(rid, UnitState::Waited);

        let output = match self.runtime.read_output(cid).await {
            Ok(output) => output,
            Err(e) => {
                self.store
                    .update_analysis_container(rid, cid, errored(INFO_READ_FAILED))
                    .await?;
                return Err(e.into());
            }
        };
        self.store
            .update_analysis_container(
                rid,
                cid,
                ContainerUpdate {
                    status: Some(ContainerStatus::Finished),
                    output: Some(output.clone()),
                    finished_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        report.advance(rid, UnitState::OutputRead);

        match analyzer.analyze(&output) {
            Ok(outcome) => {
                report.advance(rid, UnitState::Parsed);
                self.store
                    .update_analysis_container(
                        rid,
                        cid,
                        ContainerUpdate {
                            result: Some(outcome.result),
                            info: Some(outcome.info.clone()),
                            ..Default::default()
                        },
                    )
                    .await?;
                report.result = Some(outcome.result);
                report.outcome = Some(outcome);
                report.advance(rid, UnitState::Finalized);
                Ok(())
            }
            Err(e) => {
                self.store
                    .update_analysis_container(
                        rid,
                        cid,
                        ContainerUpdate {
                            result: Some(ScanResult::Error),
                            info: Some(e.info()),
                            ..Default::default()
                        },
                    )
                    .await?;
                report.result = Some(ScanResult::Error);
                if e.is_scanner_local() {
                    warn!(rid, scanner = %test.name, error = %e, "Scanner reported an internal error");
                    report.advance(rid, UnitState::Finalized);
                    Ok(())
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Records a container that never got an ID
    async fn record_failed_container(
        &self,
        rid: &str,
        test: &SecurityTest,
        info: &str,
    ) -> Result<(), ScanError> {
        let mut container = Container::new(test.clone());
        errored(info).apply(&mut container);
        self.store.add_container(rid, container).await?;
        Ok(())
    }
}

fn errored(info: &str) -> ContainerUpdate {
    ContainerUpdate {
        status: Some(ContainerStatus::Error),
        result: Some(ScanResult::Error),
        info: Some(info.to_string()),
        finished_at: Some(Utc::now()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(UnitState::ImagePulled.to_string(), "image-pulled");
        assert_eq!(UnitState::Errored.to_string(), "errored");
    }

    #[test]
    fn test_errored_update_marks_container() {
        let test = SecurityTest {
            name: "gosec".to_string(),
            image: "securego/gosec".to_string(),
            image_tag: String::new(),
            command: "gosec ./...".to_string(),
            scope: crate::model::ScannerScope::Language,
            language: "Go".to_string(),
            default_enabled: true,
            timeout_secs: 60,
        };
        let mut container = Container::new(test);
        errored(INFO_START_FAILED).apply(&mut container);

        assert_eq!(container.status, ContainerStatus::Error);
        assert_eq!(container.result, Some(ScanResult::Error));
        assert_eq!(container.info, INFO_START_FAILED);
        assert!(container.finished_at.is_some());
    }
}
