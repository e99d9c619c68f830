//! npm audit analyzer

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

const RUNNING_SENTINEL: &str = "ERROR_RUNNING_NPMAUDIT";

#[derive(Debug, Deserialize)]
struct NpmAuditOutput {
    #[serde(default)]
    advisories: BTreeMap<String, NpmAdvisory>,
    #[serde(default, alias = "FailedRunning", alias = "failedRunning")]
    failed_running: bool,
}

#[derive(Debug, Deserialize)]
struct NpmAdvisory {
    #[serde(default)]
    findings: Vec<NpmFinding>,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    vulnerable_versions: String,
    #[serde(default)]
    module_name: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct NpmFinding {
    #[serde(default)]
    version: String,
}

fn severity_for(severity: &str) -> (Bucket, &'static str) {
    match severity {
        "high" | "critical" => (Bucket::High, "high"),
        "moderate" => (Bucket::Medium, "medium"),
        _ => (Bucket::Low, "low"),
    }
}

pub struct NpmAuditAnalyzer;

impl NpmAuditAnalyzer {
    fn missing_lockfile(&self) -> Vulnerability {
        Vulnerability {
            severity: "low".to_string(),
            title: "No package-lock.json found.".to_string(),
            details: "It looks like your project doesn't have a package-lock.json file. If you use NPM to handle your dependencies, it would be a good idea to commit it so npm audit can check for vulnerabilities.".to_string(),
            ..Vulnerability::new(self.language(), self.tool())
        }
    }
}

impl OutputAnalyzer for NpmAuditAnalyzer {
    fn scanner(&self) -> &'static str {
        "npmaudit"
    }

    fn tool(&self) -> &'static str {
        "NpmAudit"
    }

    fn language(&self) -> &'static str {
        "JavaScript"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }
        if raw.contains(RUNNING_SENTINEL) {
            return Err(AnalyzerError::ToolFailure {
                tool: self.tool(),
                detail: RUNNING_SENTINEL.to_string(),
            });
        }

        let output: NpmAuditOutput = from_json(self.tool(), raw)?;
        let mut vulnerabilities = SecurityTestOutput::default();

        if output.failed_running {
            vulnerabilities.push(Bucket::Low, self.missing_lockfile());
        }

        for advisory in output.advisories.into_values() {
            let version = advisory
                .findings
                .last()
                .map(|f| f.version.clone())
                .unwrap_or_default();
            let (bucket, severity) = severity_for(&advisory.severity);
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    severity: severity.to_string(),
                    details: advisory.overview,
                    title: advisory.title,
                    kind: advisory.id.to_string(),
                    code: advisory.module_name,
                    vulnerable_below: advisory.vulnerable_versions,
                    version,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}
