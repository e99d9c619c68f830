//! Data model shared by analyzers, the runtime adapter, persistence and the pipeline
//!
//! Wire names (serde renames) follow the document shape the reporting client reads.

pub mod analysis;
pub mod security_test;
pub mod status;
pub mod vulnerability;

pub use analysis::{Analysis, Code, Container};
pub use security_test::{ScannerScope, SecurityTest};
pub use status::{AnalysisStatus, ContainerStatus, ScanResult};
pub use vulnerability::{Bucket, ConsolidatedResults, SecurityTestOutput, Vulnerability};
