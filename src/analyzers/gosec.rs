//! GoSec analyzer

use serde::Deserialize;
use serde_json::Value;

use super::error::AnalyzerError;
use super::outcome::{
    check_preconditions, from_json, scalar_to_string, ScanOutcome, INFO_ISSUES, INFO_WARNINGS,
};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

#[derive(Debug, Deserialize)]
struct GosecOutput {
    #[serde(rename = "Issues", default)]
    issues: Vec<GosecIssue>,
}

#[derive(Debug, Deserialize)]
struct GosecIssue {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    rule_id: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    line: Value,
}

impl GosecIssue {
    fn is_blocking(&self) -> bool {
        matches!(self.severity.as_str(), "HIGH" | "MEDIUM") && self.confidence == "HIGH"
    }

    fn bucket(&self) -> Bucket {
        match self.severity.as_str() {
            "HIGH" => Bucket::High,
            "MEDIUM" => Bucket::Medium,
            _ => Bucket::Low,
        }
    }
}

pub struct GosecAnalyzer;

impl OutputAnalyzer for GosecAnalyzer {
    fn scanner(&self) -> &'static str {
        "gosec"
    }

    fn tool(&self) -> &'static str {
        "GoSec"
    }

    fn language(&self) -> &'static str {
        "Go"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let output: GosecOutput = from_json(self.tool(), raw)?;
        if output.issues.is_empty() {
            return Ok(ScanOutcome::clean());
        }

        let blocking = output.issues.iter().any(GosecIssue::is_blocking);
        let mut vulnerabilities = SecurityTestOutput::default();
        for issue in output.issues {
            let bucket = issue.bucket();
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    severity: issue.severity,
                    confidence: issue.confidence,
                    kind: issue.rule_id,
                    details: issue.details,
                    file: issue.file,
                    code: issue.code,
                    line: scalar_to_string(&issue.line),
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        // Findings that are not high-confidence medium/high never fail the run
        let (result, info) = if blocking {
            (ScanResult::Failed, INFO_ISSUES)
        } else {
            (ScanResult::Warning, INFO_WARNINGS)
        };
        Ok(ScanOutcome::new(result, info, vulnerabilities))
    }
}
