use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use super::error::AnalyzerError;
use crate::model::{Code, ScanResult, SecurityTestOutput};

/// Marker the scanner images print when the repository checkout fails
pub const CLONING_SENTINEL: &str = "ERROR_CLONING";

pub const INFO_NO_ISSUES: &str = "No issues found.";
pub const INFO_ISSUES: &str = "Issues found.";
pub const INFO_WARNINGS: &str = "Warning found.";

/// Non-vulnerability data some scanners produce
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Artifacts {
    #[default]
    None,
    /// Language detector output
    Codes(Vec<Code>),
    CommitAuthors(Vec<String>),
}

/// Normalized result of interpreting one container's output
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub info: String,
    pub vulnerabilities: SecurityTestOutput,
    pub artifacts: Artifacts,
}

impl ScanOutcome {
    pub fn new(result: ScanResult, info: impl Into<String>, vulnerabilities: SecurityTestOutput) -> Self {
        Self {
            result,
            info: info.into(),
            vulnerabilities,
            artifacts: Artifacts::None,
        }
    }

    /// Passed with nothing to report
    pub fn clean() -> Self {
        Self::new(ScanResult::Passed, INFO_NO_ISSUES, SecurityTestOutput::default())
    }

    /// Grades findings by bucket: medium or high fails, low alone yields `low_only`.
    /// Suppressed (nosec) findings never affect the grade.
    pub fn graded(vulnerabilities: SecurityTestOutput, low_only: ScanResult) -> Self {
        if vulnerabilities.has_medium_or_high() {
            Self::new(ScanResult::Failed, INFO_ISSUES, vulnerabilities)
        } else if !vulnerabilities.low.is_empty() {
            Self::new(low_only, INFO_WARNINGS, vulnerabilities)
        } else {
            Self::new(ScanResult::Passed, INFO_NO_ISSUES, vulnerabilities)
        }
    }

    pub fn with_artifacts(mut self, artifacts: Artifacts) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// Checks shared by every analyzer, in priority order.
///
/// Returns `Err(Cloning)` when the sentinel is present, `Ok(true)` when the output
/// is blank and `Ok(false)` when the caller should deserialize it.
pub(crate) fn check_preconditions(raw: &str) -> Result<bool, AnalyzerError> {
    if raw.contains(CLONING_SENTINEL) {
        return Err(AnalyzerError::Cloning);
    }
    Ok(raw.trim().is_empty())
}

pub(crate) fn malformed(tool: &'static str, raw: &str, reason: impl ToString) -> AnalyzerError {
    let reason = reason.to_string();
    error!(tool, raw_output = raw, "Failed to parse scanner output: {}", reason);
    AnalyzerError::Malformed {
        tool,
        reason,
        raw: raw.to_string(),
    }
}

pub(crate) fn from_json<T: DeserializeOwned>(tool: &'static str, raw: &str) -> Result<T, AnalyzerError> {
    serde_json::from_str(raw.trim()).map_err(|e| malformed(tool, raw, e))
}

/// Renders JSON scalars the way tools mean them ("12", "a.go"); null becomes empty
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn line_span(start: impl ToString, end: impl ToString) -> String {
    format!(
        "Code between Line {} and Line {}.",
        start.to_string(),
        end.to_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bucket, Vulnerability};

    #[test]
    fn test_preconditions_priority() {
        assert!(matches!(
            check_preconditions("ERROR_CLONING\n"),
            Err(AnalyzerError::Cloning)
        ));
        assert!(check_preconditions("").unwrap());
        assert!(check_preconditions(" \r\n").unwrap());
        assert!(!check_preconditions("{}").unwrap());
    }

    #[test]
    fn test_graded() {
        let mut low_only = SecurityTestOutput::default();
        low_only.push(Bucket::Low, Vulnerability::default());
        let outcome = ScanOutcome::graded(low_only.clone(), ScanResult::Warning);
        assert_eq!(outcome.result, ScanResult::Warning);
        assert_eq!(outcome.info, INFO_WARNINGS);

        let mut with_high = low_only;
        with_high.push(Bucket::High, Vulnerability::default());
        assert_eq!(
            ScanOutcome::graded(with_high, ScanResult::Warning).result,
            ScanResult::Failed
        );

        let mut nosec_only = SecurityTestOutput::default();
        nosec_only.push(Bucket::NoSec, Vulnerability::default());
        let outcome = ScanOutcome::graded(nosec_only, ScanResult::Warning);
        assert_eq!(outcome.result, ScanResult::Passed);
        assert_eq!(outcome.info, INFO_NO_ISSUES);
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&Value::from(12)), "12");
        assert_eq!(scalar_to_string(&Value::from("12-14")), "12-14");
        assert_eq!(scalar_to_string(&Value::Null), "");
    }
}
