//! Fan-out coordinator
//!
//! Runs the language detector, selects the scanners the detected languages
//! call for, and runs them as two concurrent batches (generic and language).
//! The analysis is written exactly once, after both batches drain or the first
//! hard error ends them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::error::{CoordinatorError, ScanError};
use super::unit::{ScanRequest, ScanUnit, UnitReport};
use super::verdict::final_result;
use crate::analyzers::Artifacts;
use crate::model::{Analysis, AnalysisStatus, Code, ConsolidatedResults, ScanResult, SecurityTest};
use crate::scanners::ScannerQuery;
use crate::store::{AnalysisStore, AnalysisUpdate, StoreError};

/// Scanner whose output seeds the fan-out
pub const LANGUAGE_DETECTOR: &str = "enry";

/// Scanners selected for one analysis, each listed once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPlan {
    pub generic: Vec<SecurityTest>,
    pub language: Vec<SecurityTest>,
}

impl ScanPlan {
    pub fn scanner_names(&self) -> Vec<&str> {
        self.generic
            .iter()
            .chain(&self.language)
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.generic.len() + self.language.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Data gathered from unit reports, written with the final update
#[derive(Debug, Default)]
struct Collected {
    codes: Vec<Code>,
    commit_authors: Vec<String>,
    results: ConsolidatedResults,
}

impl Collected {
    fn absorb(&mut self, report: &UnitReport) {
        let Some(outcome) = &report.outcome else {
            return;
        };
        match &outcome.artifacts {
            Artifacts::Codes(codes) => self.codes = codes.clone(),
            Artifacts::CommitAuthors(authors) => self.commit_authors = authors.clone(),
            Artifacts::None => {}
        }
        if !outcome.vulnerabilities.is_empty() {
            self.results
                .merge(&report.language, &report.tool, outcome.vulnerabilities.clone());
        }
    }
}

type UnitMessage = Result<UnitReport, (String, ScanError)>;

#[derive(Clone)]
pub struct FanOutCoordinator {
    unit: ScanUnit,
}

impl FanOutCoordinator {
    pub fn new(unit: ScanUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &ScanUnit {
        &self.unit
    }

    fn store(&self) -> &Arc<dyn AnalysisStore> {
        self.unit.store()
    }

    /// Runs every applicable scanner and finalizes the analysis.
    ///
    /// Hard errors are recorded on the analysis (`error running` / `error`)
    /// rather than returned; `Err` only means the final write itself failed.
    pub async fn run(&self, request: ScanRequest) -> Result<Analysis, CoordinatorError> {
        let start = Instant::now();
        info!(rid = %request.rid, url = %request.url, branch = %request.branch, "Starting analysis");

        let mut collected = Collected::default();
        let outcome = self.execute(&request, &mut collected).await;
        if let Err(e) = &outcome {
            error!(rid = %request.rid, error = %e, "Analysis aborted");
        }

        let analysis = self.finalize(&request, collected, outcome).await?;
        info!(
            rid = %analysis.rid,
            status = %analysis.status,
            result = ?analysis.result,
            containers = analysis.containers.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis finalized"
        );
        Ok(analysis)
    }

    async fn execute(
        &self,
        request: &ScanRequest,
        collected: &mut Collected,
    ) -> Result<(), CoordinatorError> {
        let detector = self.find_one(LANGUAGE_DETECTOR).await?;
        let report = self
            .unit
            .run(request, &detector)
            .await
            .map_err(|source| CoordinatorError::Unit {
                scanner: detector.name.clone(),
                source,
            })?;
        collected.absorb(&report);
        if report.duplicate {
            collected.codes = self.store().find_analysis(&request.rid).await?.codes;
        }
        debug!(rid = %request.rid, languages = collected.codes.len(), "Languages detected");

        let plan = self.plan(&collected.codes).await?;
        info!(
            rid = %request.rid,
            generic = plan.generic.len(),
            language = plan.language.len(),
            "Scanners selected"
        );

        let abandon = Arc::new(AtomicBool::new(false));
        let (generic, language) = tokio::try_join!(
            self.run_batch("generic", request, plan.generic, Arc::clone(&abandon)),
            self.run_batch("language", request, plan.language, Arc::clone(&abandon)),
        )?;

        for report in generic.iter().chain(&language) {
            collected.absorb(report);
        }
        Ok(())
    }

    /// Selects default generic scanners plus default language scanners for every
    /// detected language, each scanner at most once
    pub async fn plan(&self, codes: &[Code]) -> Result<ScanPlan, CoordinatorError> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(LANGUAGE_DETECTOR.to_string());

        let mut plan = ScanPlan::default();
        for test in self.find_or_empty(&ScannerQuery::generic_defaults()).await? {
            if seen.insert(test.name.clone()) {
                plan.generic.push(test);
            }
        }
        for code in codes {
            let query = ScannerQuery::language_defaults(code.language.as_str());
            for test in self.find_or_empty(&query).await? {
                if seen.insert(test.name.clone()) {
                    plan.language.push(test);
                }
            }
        }
        Ok(plan)
    }

    /// Runs one batch concurrently.
    ///
    /// Returns on the first unit error without waiting for the rest; units already
    /// running finish on their own and still record their containers, but no unit
    /// that has not begun yet will start, and later errors are dropped.
    async fn run_batch(
        &self,
        batch: &'static str,
        request: &ScanRequest,
        tests: Vec<SecurityTest>,
        abandon: Arc<AtomicBool>,
    ) -> Result<Vec<UnitReport>, CoordinatorError> {
        if tests.is_empty() {
            return Ok(Vec::new());
        }

        let total = tests.len();
        debug!(rid = %request.rid, batch, total, "Launching batch");
        // Sized to the batch so no unit ever blocks on send
        let (tx, mut rx) = mpsc::channel::<UnitMessage>(total);

        for test in tests {
            let unit = self.unit.clone();
            let request = request.clone();
            let tx = tx.clone();
            let abandon = Arc::clone(&abandon);

            tokio::spawn(async move {
                if abandon.load(Ordering::SeqCst) {
                    debug!(rid = %request.rid, scanner = %test.name, "Batch abandoned, not starting unit");
                    return;
                }
                let message = unit.run(&request, &test).await.map_err(|e| (test.name.clone(), e));
                if message.is_err() && abandon.load(Ordering::SeqCst) {
                    warn!(rid = %request.rid, scanner = %test.name, "Discarding unit error after abort");
                    return;
                }
                let _ = tx.send(message).await;
            });
        }
        drop(tx);

        let mut reports = Vec::with_capacity(total);
        while let Some(message) = rx.recv().await {
            match message {
                Ok(report) => reports.push(report),
                Err((scanner, source)) => {
                    abandon.store(true, Ordering::SeqCst);
                    return Err(CoordinatorError::Unit { scanner, source });
                }
            }
        }
        debug!(rid = %request.rid, batch, completed = reports.len(), "Batch drained");
        Ok(reports)
    }

    async fn finalize(
        &self,
        request: &ScanRequest,
        collected: Collected,
        outcome: Result<(), CoordinatorError>,
    ) -> Result<Analysis, CoordinatorError> {
        let mut update = AnalysisUpdate {
            codes: Some(collected.codes),
            commit_authors: Some(collected.commit_authors),
            results: Some(collected.results),
            finished_at: Some(Utc::now()),
            ..Default::default()
        };

        match outcome {
            Ok(()) => {
                let current = self.store().find_analysis(&request.rid).await?;
                update.status = Some(AnalysisStatus::Finished);
                update.result = Some(final_result(&current.containers));
            }
            Err(e) => {
                update.status = Some(AnalysisStatus::ErrorRunning);
                update.result = Some(ScanResult::Error);
                update.error_found = Some(e.to_string());
            }
        }

        self.store().update_analysis(&request.rid, update).await?;
        Ok(self.store().find_analysis(&request.rid).await?)
    }

    async fn find_one(&self, name: &str) -> Result<SecurityTest, CoordinatorError> {
        self.find_or_empty(&ScannerQuery::by_name(name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoordinatorError::MissingScanner(name.to_string()))
    }

    async fn find_or_empty(&self, query: &ScannerQuery) -> Result<Vec<SecurityTest>, StoreError> {
        match self.store().find_scanners(query).await {
            Ok(tests) => Ok(tests),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
