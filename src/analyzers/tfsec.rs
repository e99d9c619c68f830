//! tfsec analyzer

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, line_span, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

#[derive(Debug, Deserialize)]
struct TfsecOutput {
    #[serde(default)]
    results: Option<Vec<TfsecResult>>,
}

#[derive(Debug, Deserialize)]
struct TfsecResult {
    #[serde(default)]
    rule_id: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    location: TfsecLocation,
    #[serde(default)]
    description: String,
    #[serde(default)]
    severity: String,
}

#[derive(Debug, Default, Deserialize)]
struct TfsecLocation {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    start_line: u64,
    #[serde(default)]
    end_line: u64,
}

/// Accepts both the legacy INFO/WARNING/ERROR scale and the newer severity names
fn severity_for(severity: &str) -> (Bucket, &'static str) {
    match severity {
        "ERROR" | "HIGH" | "CRITICAL" => (Bucket::High, "High"),
        "WARNING" | "MEDIUM" => (Bucket::Medium, "Medium"),
        _ => (Bucket::Low, "Low"),
    }
}

pub struct TfsecAnalyzer;

impl OutputAnalyzer for TfsecAnalyzer {
    fn scanner(&self) -> &'static str {
        "tfsec"
    }

    fn tool(&self) -> &'static str {
        "TFSec"
    }

    fn language(&self) -> &'static str {
        "HCL"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let output: TfsecOutput = from_json(self.tool(), raw)?;
        let results = output.results.unwrap_or_default();
        if results.is_empty() {
            return Ok(ScanOutcome::clean());
        }

        let mut vulnerabilities = SecurityTestOutput::default();
        for result in results {
            let (bucket, severity) = severity_for(&result.severity);
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    severity: severity.to_string(),
                    details: format!("{} @ [{}]", result.rule_id, result.description),
                    title: result.description,
                    kind: result.rule_id,
                    file: result.location.filename,
                    line: result.location.start_line.to_string(),
                    code: line_span(result.location.start_line, result.location.end_line),
                    vulnerable_below: result.link,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}
