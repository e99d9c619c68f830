//! Shared fixtures for pipeline tests: a scripted container engine and helpers
//! that wire a coordinator over the in-memory store.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scanfleet::pipeline::{FanOutCoordinator, ScanRequest, ScanUnit};
use scanfleet::runtime::{ContainerRuntime, RuntimeAdapter, RuntimeError};
use scanfleet::store::{AnalysisStore, AnalysisUpdate, ContainerUpdate, StoreError};
use scanfleet::{Analysis, AnalyzerRegistry, Container, MemoryStore, ScannerRegistry, SecurityTest};
use scanfleet::scanners::ScannerQuery;

/// Scanner definitions used across the pipeline tests
pub const SCANNERS_YAML: &str = r#"
scanners:
  - {name: enry, image: scanfleet/enry, cmd: "enry %GIT_REPO% %GIT_BRANCH%", type: Generic, default: false, timeOutSeconds: 60}
  - {name: gitauthors, image: scanfleet/gitauthors, cmd: "authors %GIT_REPO%", type: Generic, default: true, timeOutSeconds: 60}
  - {name: gitleaks, image: scanfleet/gitleaks, cmd: "gitleaks %GIT_REPO%", type: Generic, default: true, timeOutSeconds: 600}
  - {name: gosec, image: scanfleet/gosec, cmd: "gosec %GIT_REPO%", type: Language, language: Go, default: true, timeOutSeconds: 30}
  - {name: bandit, image: scanfleet/bandit, cmd: "bandit %GIT_REPO%", type: Language, language: Python, default: true, timeOutSeconds: 360}
  - {name: safety, image: scanfleet/safety, cmd: "safety %GIT_REPO%", type: Language, language: Python, default: false, timeOutSeconds: 360}
  - {name: npmaudit, image: scanfleet/npmaudit, cmd: "npm audit %GIT_REPO%", type: Language, language: JavaScript, default: true, timeOutSeconds: 360}
  - {name: yarnaudit, image: scanfleet/yarnaudit, cmd: "yarn audit %GIT_REPO%", type: Language, language: JavaScript, default: true, timeOutSeconds: 360}
"#;

pub const REPO_URL: &str = "https://github.com/org/app.git";
pub const BRANCH: &str = "main";

/// How a scripted container's wait call behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBehavior {
    Exit,
    NonZero(i64),
    Hang,
    Sleep(Duration),
}

/// Scripted behavior for one scanner image
#[derive(Debug, Clone)]
pub struct Script {
    pub output: String,
    pub wait: WaitBehavior,
    pub create_fails: bool,
    pub pull_fails: bool,
    pub start_failures: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            output: String::new(),
            wait: WaitBehavior::Exit,
            create_fails: false,
            pull_fails: false,
            start_failures: 0,
        }
    }
}

impl Script {
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn waiting(wait: WaitBehavior) -> Self {
        Self {
            wait,
            ..Default::default()
        }
    }
}

/// In-process container engine driven by per-scanner scripts.
///
/// Containers are named `<scanner>-<n>`. Unscripted scanners exit cleanly with
/// empty output, except the language detector which reports no languages.
#[derive(Default)]
pub struct FakeRuntime {
    scripts: Mutex<HashMap<String, Script>>,
    containers: Mutex<HashMap<String, String>>,
    starts: Mutex<HashMap<String, usize>>,
    next_id: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<String>>,
    pub removed: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
    /// Extra containers reported as running, as if left by other workloads
    pub strays: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default().script("enry", Script::output("{}"))
    }

    pub fn script(self, scanner: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(scanner.to_string(), script);
        self
    }

    pub fn with_strays(self, strays: &[&str]) -> Self {
        *self.strays.lock().unwrap() = strays.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Scanners for which a container was created, in creation order
    pub fn created_scanners(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn removed_cids(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    fn scanner_of_image(image: &str) -> String {
        let name = image
            .rsplit('/')
            .next()
            .unwrap_or(image)
            .split(':')
            .next()
            .unwrap_or(image);
        name.to_string()
    }

    fn script_for_scanner(&self, scanner: &str) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get(scanner)
            .cloned()
            .unwrap_or_default()
    }

    fn script_for_cid(&self, cid: &str) -> Result<(String, Script), RuntimeError> {
        let scanner = self
            .containers
            .lock()
            .unwrap()
            .get(cid)
            .cloned()
            .ok_or_else(|| RuntimeError::Engine(format!("No such container: {}", cid)))?;
        let script = self.script_for_scanner(&scanner);
        Ok((scanner, script))
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn image_is_loaded(&self, image: &str) -> Result<bool, RuntimeError> {
        Ok(!self.script_for_scanner(&Self::scanner_of_image(image)).pull_fails)
    }

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.script_for_scanner(&Self::scanner_of_image(image)).pull_fails {
            return Err(RuntimeError::Engine(format!("manifest for {} not found", image)));
        }
        Ok(())
    }

    async fn create_container(&self, image: &str, cmd: &str) -> Result<String, RuntimeError> {
        let scanner = Self::scanner_of_image(image);
        if self.script_for_scanner(&scanner).create_fails {
            return Err(RuntimeError::Engine("no space left on device".to_string()));
        }
        let cid = format!("{}-{}", scanner, self.next_id.fetch_add(1, Ordering::SeqCst));
        self.containers
            .lock()
            .unwrap()
            .insert(cid.clone(), scanner.clone());
        self.created.lock().unwrap().push(scanner);
        self.commands.lock().unwrap().push(cmd.to_string());
        Ok(cid)
    }

    async fn start_container(&self, cid: &str) -> Result<(), RuntimeError> {
        let (_, script) = self.script_for_cid(cid)?;
        let mut starts = self.starts.lock().unwrap();
        let attempt = starts.entry(cid.to_string()).or_insert(0);
        *attempt += 1;
        if *attempt <= script.start_failures {
            return Err(RuntimeError::Engine("device or resource busy".to_string()));
        }
        Ok(())
    }

    async fn wait_container(&self, cid: &str) -> Result<(), RuntimeError> {
        let (_, script) = self.script_for_cid(cid)?;
        match script.wait {
            WaitBehavior::Exit => Ok(()),
            WaitBehavior::NonZero(code) => Err(RuntimeError::NonZeroExit { code }),
            WaitBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            WaitBehavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }

    async fn read_output(&self, cid: &str) -> Result<String, RuntimeError> {
        let (_, script) = self.script_for_cid(cid)?;
        Ok(script.output)
    }

    async fn stop_container(&self, cid: &str) -> Result<(), RuntimeError> {
        self.stopped.lock().unwrap().push(cid.to_string());
        Ok(())
    }

    async fn remove_container(&self, cid: &str) -> Result<(), RuntimeError> {
        self.removed.lock().unwrap().push(cid.to_string());
        self.strays.lock().unwrap().retain(|s| s != cid);
        Ok(())
    }

    async fn list_running(&self) -> Result<Vec<String>, RuntimeError> {
        let removed: HashSet<String> = self.removed.lock().unwrap().iter().cloned().collect();
        let mut running: Vec<String> = self
            .containers
            .lock()
            .unwrap()
            .keys()
            .filter(|cid| !removed.contains(*cid))
            .cloned()
            .collect();
        running.extend(self.strays.lock().unwrap().iter().cloned());
        Ok(running)
    }
}

/// Store wrapper counting analysis-level writes
pub struct CountingStore {
    inner: MemoryStore,
    pub analysis_updates: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            analysis_updates: AtomicUsize::new(0),
        }
    }

    pub fn updates(&self) -> usize {
        self.analysis_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisStore for CountingStore {
    async fn insert_analysis(&self, analysis: Analysis) -> Result<(), StoreError> {
        self.inner.insert_analysis(analysis).await
    }

    async fn find_analysis(&self, rid: &str) -> Result<Analysis, StoreError> {
        self.inner.find_analysis(rid).await
    }

    async fn find_running(&self, url: &str, branch: &str) -> Result<Option<Analysis>, StoreError> {
        self.inner.find_running(url, branch).await
    }

    async fn update_analysis(&self, rid: &str, update: AnalysisUpdate) -> Result<(), StoreError> {
        self.analysis_updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_analysis(rid, update).await
    }

    async fn add_container(&self, rid: &str, container: Container) -> Result<bool, StoreError> {
        self.inner.add_container(rid, container).await
    }

    async fn update_analysis_container(
        &self,
        rid: &str,
        cid: &str,
        update: ContainerUpdate,
    ) -> Result<(), StoreError> {
        self.inner.update_analysis_container(rid, cid, update).await
    }

    async fn find_scanners(&self, query: &ScannerQuery) -> Result<Vec<SecurityTest>, StoreError> {
        self.inner.find_scanners(query).await
    }
}

pub fn registry() -> ScannerRegistry {
    ScannerRegistry::from_yaml(SCANNERS_YAML).unwrap()
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(registry()))
}

pub fn unit(
    engine: Arc<FakeRuntime>,
    store: Arc<dyn AnalysisStore>,
    max_containers: usize,
) -> ScanUnit {
    ScanUnit::new(
        RuntimeAdapter::new(engine, max_containers),
        Arc::new(AnalyzerRegistry::with_defaults()),
        store,
    )
}

pub fn coordinator(engine: Arc<FakeRuntime>, store: Arc<dyn AnalysisStore>) -> FanOutCoordinator {
    FanOutCoordinator::new(unit(engine, store, 100))
}

/// Inserts a running analysis for the default repository and returns its request
pub async fn seed_analysis(store: &dyn AnalysisStore, rid: &str) -> ScanRequest {
    store
        .insert_analysis(Analysis::new(rid, REPO_URL, BRANCH))
        .await
        .unwrap();
    ScanRequest::new(rid, REPO_URL, BRANCH)
}

pub fn enry_output(languages: &[&str]) -> String {
    let entries: Vec<String> = languages
        .iter()
        .map(|l| format!("\"{}\":[\"src/main.{}\"]", l, l.to_lowercase()))
        .collect();
    format!("{{{}}}", entries.join(","))
}

pub fn gosec_issue(severity: &str, confidence: &str) -> String {
    format!(
        r#"{{"Issues":[{{"severity":"{}","confidence":"{}","rule_id":"G404","details":"Use of weak random number generator","file":"main.go","code":"rand.Int()","line":"12"}}],"Stats":{{}}}}"#,
        severity, confidence
    )
}

pub fn npm_low_advisory() -> String {
    r#"{"advisories":{"96":{"findings":[{"version":"0.0.5"}],"id":96,"module_name":"debug","vulnerable_versions":"<2.6.9","severity":"low","overview":"ReDoS","title":"Regular Expression Denial of Service"}},"metadata":{}}"#.to_string()
}

pub fn yarn_low_advisory() -> String {
    r#"{"advisories":[{"findings":[{"version":"0.0.5"}],"id":96,"module_name":"debug","vulnerable_versions":"<2.6.9","severity":"low","overview":"ReDoS","title":"Regular Expression Denial of Service"}]}"#.to_string()
}
