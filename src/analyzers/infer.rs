//! Infer analyzer

use serde::Deserialize;
use serde_json::Value;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, scalar_to_string, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

#[derive(Debug, Deserialize)]
struct InferIssue {
    #[serde(default)]
    bug_type: String,
    #[serde(default)]
    qualifier: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: Value,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    bug_type_hum: String,
}

fn bucket_for(severity: &str) -> Bucket {
    match severity {
        "ERROR" => Bucket::High,
        "WARNING" => Bucket::Medium,
        _ => Bucket::Low,
    }
}

pub struct InferAnalyzer;

impl OutputAnalyzer for InferAnalyzer {
    fn scanner(&self) -> &'static str {
        "infer"
    }

    fn tool(&self) -> &'static str {
        "Infer"
    }

    fn language(&self) -> &'static str {
        "Java"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let issues: Vec<InferIssue> = from_json(self.tool(), raw)?;
        let mut vulnerabilities = SecurityTestOutput::default();
        for issue in issues {
            vulnerabilities.push(
                bucket_for(&issue.severity),
                Vulnerability {
                    severity: issue.severity,
                    kind: issue.bug_type,
                    title: issue.bug_type_hum,
                    details: issue.qualifier,
                    file: issue.file,
                    line: scalar_to_string(&issue.line),
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}
