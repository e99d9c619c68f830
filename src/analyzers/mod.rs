//! Output analyzers
//!
//! One analyzer per scanning tool. Each turns the container's raw stdout into a
//! [`ScanOutcome`]: a verdict, a human-readable info line, findings grouped by
//! severity bucket, and any non-vulnerability artifacts (detected languages,
//! commit authors).
//!
//! Every analyzer applies the same preconditions first: the `ERROR_CLONING`
//! sentinel anywhere in the output is an error, and blank output means nothing
//! was found.

pub mod bandit;
pub mod brakeman;
pub mod enry;
pub mod error;
pub mod gitauthors;
pub mod gitleaks;
pub mod gosec;
pub mod infer;
pub mod npmaudit;
pub mod outcome;
pub mod registry;
pub mod safety;
pub mod securitycodescan;
pub mod spotbugs;
pub mod tfsec;
pub mod trait_def;
pub mod yarnaudit;

pub use bandit::BanditAnalyzer;
pub use brakeman::BrakemanAnalyzer;
pub use enry::EnryAnalyzer;
pub use error::AnalyzerError;
pub use gitauthors::GitAuthorsAnalyzer;
pub use gitleaks::GitleaksAnalyzer;
pub use gosec::GosecAnalyzer;
pub use infer::InferAnalyzer;
pub use npmaudit::NpmAuditAnalyzer;
pub use outcome::{Artifacts, ScanOutcome, CLONING_SENTINEL};
pub use registry::AnalyzerRegistry;
pub use safety::SafetyAnalyzer;
pub use securitycodescan::SecurityCodeScanAnalyzer;
pub use spotbugs::SpotBugsAnalyzer;
pub use tfsec::TfsecAnalyzer;
pub use trait_def::OutputAnalyzer;
pub use yarnaudit::YarnAuditAnalyzer;
