//! scanfleet - security-scan orchestrator
//!
//! Given a git repository and branch, scanfleet runs a language detector in a
//! container, selects the security scanners the detected languages call for,
//! runs them concurrently in their own containers, normalizes every tool's
//! output into one vulnerability model and folds the per-scanner results into a
//! single passed/failed/warning verdict.
//!
//! # Core Concepts
//!
//! - **Output analyzers**: one per scanner tool, turning raw JSON/XML output into
//!   findings bucketed by severity plus a coarse result
//! - **Runtime adapter**: container engine access with pull retry, start retry,
//!   a client-side wait deadline and a container-count safety valve
//! - **Scan unit**: the lifecycle of one scanner for one analysis
//! - **Fan-out coordinator**: detection, scanner selection, concurrent batches
//!   and the final verdict
//!
//! # Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use scanfleet::{
//!     AnalysisService, AnalyzerRegistry, DockerRuntime, FanOutCoordinator, MemoryStore,
//!     RuntimeAdapter, ScanUnit, ScanfleetConfig, ScannerRegistry,
//! };
//!
//! async fn scan() -> anyhow::Result<()> {
//!     let config = ScanfleetConfig::from_env()?;
//!     let registry = ScannerRegistry::from_file(&config.scanners_file)?;
//!     let runtime = RuntimeAdapter::new(
//!         Arc::new(DockerRuntime::connect(&config)?),
//!         config.max_containers,
//!     );
//!     let unit = ScanUnit::new(
//!         runtime,
//!         Arc::new(AnalyzerRegistry::with_defaults()),
//!         Arc::new(MemoryStore::new(registry)),
//!     );
//!     let service = AnalysisService::new(FanOutCoordinator::new(unit));
//!
//!     let submission = service.submit("https://github.com/org/app.git", "main").await?;
//!     let analysis = submission.handle.await??;
//!     println!("{} {:?}", analysis.rid, analysis.result);
//!     Ok(())
//! }
//! ```

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod runtime;
pub mod scanners;
pub mod store;
pub mod util;

pub use analyzers::{AnalyzerError, AnalyzerRegistry, OutputAnalyzer, ScanOutcome};
pub use config::{ConfigError, ScanfleetConfig};
pub use model::{Analysis, Container, ScanResult, SecurityTest, Vulnerability};
pub use pipeline::{AnalysisService, FanOutCoordinator, ScanUnit};
pub use runtime::{ContainerRuntime, DockerRuntime, RuntimeAdapter, RuntimeError};
pub use scanners::ScannerRegistry;
pub use store::{AnalysisStore, MemoryStore, StoreError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
