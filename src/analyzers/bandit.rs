//! Bandit analyzer
//!
//! Findings whose flagged line carries the suppression marker are kept in the
//! nosec bucket and never affect the verdict.

use serde::Deserialize;
use serde_json::Value;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, ScanOutcome, INFO_ISSUES, INFO_WARNINGS};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};
use crate::util::text::has_nohusky_marker;

#[derive(Debug, Deserialize)]
struct BanditOutput {
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    results: Vec<BanditResult>,
}

#[derive(Debug, Deserialize)]
struct BanditResult {
    #[serde(default)]
    code: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    issue_confidence: String,
    #[serde(default)]
    issue_severity: String,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    line_number: u64,
    #[serde(default)]
    test_id: String,
    #[serde(default)]
    test_name: String,
}

impl BanditResult {
    fn is_blocking(&self) -> bool {
        matches!(self.issue_severity.as_str(), "HIGH" | "MEDIUM") && self.issue_confidence == "HIGH"
    }

    fn bucket(&self) -> Bucket {
        match self.issue_severity.as_str() {
            "HIGH" => Bucket::High,
            "MEDIUM" => Bucket::Medium,
            _ => Bucket::Low,
        }
    }
}

fn reports_errors(errors: &Value) -> bool {
    match errors {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

pub struct BanditAnalyzer;

impl OutputAnalyzer for BanditAnalyzer {
    fn scanner(&self) -> &'static str {
        "bandit"
    }

    fn tool(&self) -> &'static str {
        "Bandit"
    }

    fn language(&self) -> &'static str {
        "Python"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let output: BanditOutput = from_json(self.tool(), raw)?;
        if reports_errors(&output.errors) {
            return Err(AnalyzerError::ToolFailure {
                tool: self.tool(),
                detail: output.errors.to_string(),
            });
        }
        if output.results.is_empty() {
            return Ok(ScanOutcome::clean());
        }

        let mut blocking = false;
        let mut vulnerabilities = SecurityTestOutput::default();
        for result in output.results {
            let bucket = if has_nohusky_marker(&result.code, result.line_number) {
                Bucket::NoSec
            } else {
                blocking |= result.is_blocking();
                result.bucket()
            };
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    severity: result.issue_severity,
                    confidence: result.issue_confidence,
                    details: result.issue_text,
                    file: result.filename,
                    line: result.line_number.to_string(),
                    code: result.code,
                    kind: result.test_id,
                    title: result.test_name,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        let outcome = if blocking {
            ScanOutcome::new(ScanResult::Failed, INFO_ISSUES, vulnerabilities)
        } else {
            ScanOutcome::new(ScanResult::Passed, INFO_WARNINGS, vulnerabilities)
        };
        Ok(outcome)
    }
}
