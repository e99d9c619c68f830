//! yarn audit analyzer

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

const LOCKFILE_MISSING: &str = "ERROR_YARN_LOCK_NOT_FOUND";
const RUNNING_SENTINEL: &str = "ERROR_RUNNING_YARN_AUDIT";

#[derive(Debug, Deserialize)]
struct YarnAuditOutput {
    #[serde(default)]
    advisories: Vec<YarnAdvisory>,
}

#[derive(Debug, Deserialize)]
struct YarnAdvisory {
    #[serde(default)]
    findings: Vec<YarnFinding>,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    module_name: String,
    #[serde(default)]
    vulnerable_versions: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct YarnFinding {
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

pub struct YarnAuditAnalyzer;

impl YarnAuditAnalyzer {
    fn notice(&self, title: &str, details: &str) -> ScanOutcome {
        let mut vulnerabilities = SecurityTestOutput::default();
        vulnerabilities.push(
            Bucket::Low,
            Vulnerability {
                severity: "low".to_string(),
                title: title.to_string(),
                details: details.to_string(),
                occurrences: 1,
                ..Vulnerability::new(self.language(), self.tool())
            },
        );
        ScanOutcome::graded(vulnerabilities, ScanResult::Warning)
    }
}

impl OutputAnalyzer for YarnAuditAnalyzer {
    fn scanner(&self) -> &'static str {
        "yarnaudit"
    }

    fn tool(&self) -> &'static str {
        "YarnAudit"
    }

    fn language(&self) -> &'static str {
        "JavaScript"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }
        if raw.contains(LOCKFILE_MISSING) {
            return Ok(self.notice(
                "No yarn.lock found.",
                "It looks like your project doesn't have a yarn.lock file. If you use Yarn to handle your dependencies, it would be a good idea to commit it so yarn audit can check for vulnerabilities.",
            ));
        }
        if raw.contains(RUNNING_SENTINEL) {
            return Ok(self.notice(
                "Error while running yarn audit scan.",
                "Yarn audit could not finish. Check that yarn.lock is consistent with package.json.",
            ));
        }

        let output: YarnAuditOutput = from_json(self.tool(), raw)?;
        let mut vulnerabilities = SecurityTestOutput::default();
        for advisory in output.advisories {
            let version = advisory
                .findings
                .last()
                .map(|f| f.version.clone())
                .unwrap_or_default();
            let (bucket, severity) = severity_for(&advisory.severity);
            vulnerabilities.push_deduplicated(
                bucket,
                Vulnerability {
                    title: format!(
                        "Vulnerable Dependency: {} {} ({})",
                        advisory.module_name, advisory.vulnerable_versions, advisory.title
                    ),
                    severity: severity.to_string(),
                    details: advisory.overview,
                    kind: advisory.id.to_string(),
                    code: advisory.module_name,
                    vulnerable_below: advisory.vulnerable_versions,
                    version,
                    occurrences: 1,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}
