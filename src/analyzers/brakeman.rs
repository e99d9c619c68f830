//! Brakeman analyzer

use serde::Deserialize;
use serde_json::Value;

use super::error::AnalyzerError;
use super::outcome::{
    check_preconditions, from_json, scalar_to_string, ScanOutcome, INFO_ISSUES, INFO_WARNINGS,
};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

#[derive(Debug, Deserialize)]
struct BrakemanOutput {
    #[serde(default)]
    warnings: Vec<BrakemanWarning>,
}

#[derive(Debug, Deserialize)]
struct BrakemanWarning {
    #[serde(default)]
    warning_type: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: Value,
    #[serde(default)]
    link: String,
    #[serde(default)]
    confidence: String,
}

impl BrakemanWarning {
    /// Confidence drives the bucket; brakeman's "Weak" is treated as low
    fn bucket(&self) -> Bucket {
        match self.confidence.as_str() {
            "High" => Bucket::High,
            "Medium" => Bucket::Medium,
            _ => Bucket::Low,
        }
    }

    fn details(&self) -> String {
        if self.link.is_empty() {
            self.message.clone()
        } else {
            format!("{} {}", self.message, self.link)
        }
    }
}

pub struct BrakemanAnalyzer;

impl OutputAnalyzer for BrakemanAnalyzer {
    fn scanner(&self) -> &'static str {
        "brakeman"
    }

    fn tool(&self) -> &'static str {
        "Brakeman"
    }

    fn language(&self) -> &'static str {
        "Ruby"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let output: BrakemanOutput = from_json(self.tool(), raw)?;
        if output.warnings.is_empty() {
            return Ok(ScanOutcome::clean());
        }

        let mut vulnerabilities = SecurityTestOutput::default();
        for warning in output.warnings {
            let bucket = warning.bucket();
            let details = warning.details();
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    confidence: warning.confidence,
                    details,
                    file: warning.file,
                    line: scalar_to_string(&warning.line),
                    code: warning.code.unwrap_or_default(),
                    kind: warning.warning_type.clone(),
                    title: warning.warning_type,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        let outcome = if vulnerabilities.has_medium_or_high() {
            ScanOutcome::new(ScanResult::Failed, INFO_ISSUES, vulnerabilities)
        } else {
            ScanOutcome::new(ScanResult::Passed, INFO_WARNINGS, vulnerabilities)
        };
        Ok(outcome)
    }
}
