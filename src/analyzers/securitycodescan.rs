//! Security Code Scan analyzer (SARIF output)

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, line_span, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

const RUNNING_SENTINEL: &str = "ERROR_SECURITY_CODE_SCAN_RUNNING";

/// Directory the scanner image checks the repository out into
const CHECKOUT_DIR: &str = "code/";

#[derive(Debug, Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
struct SarifRun {
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    #[serde(default)]
    rule_id: String,
    #[serde(default)]
    level: String,
    #[serde(default)]
    message: SarifMessage,
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct SarifMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    #[serde(default)]
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    #[serde(default)]
    artifact_location: SarifArtifact,
    #[serde(default)]
    region: SarifRegion,
}

#[derive(Debug, Default, Deserialize)]
struct SarifArtifact {
    #[serde(default)]
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    #[serde(default)]
    start_line: u64,
    #[serde(default)]
    end_line: u64,
}

fn relative_path(uri: &str) -> String {
    match uri.split_once(CHECKOUT_DIR) {
        Some((_, path)) => path.to_string(),
        None => uri.to_string(),
    }
}

fn severity_for(level: &str) -> (Bucket, &'static str) {
    match level {
        "error" => (Bucket::High, "High"),
        "warning" => (Bucket::Medium, "Medium"),
        _ => (Bucket::Low, "Low"),
    }
}

pub struct SecurityCodeScanAnalyzer;

impl OutputAnalyzer for SecurityCodeScanAnalyzer {
    fn scanner(&self) -> &'static str {
        "securitycodescan"
    }

    fn tool(&self) -> &'static str {
        "Security Code Scan"
    }

    fn language(&self) -> &'static str {
        "C#"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let mut vulnerabilities = SecurityTestOutput::default();
        if raw.contains(RUNNING_SENTINEL) {
            vulnerabilities.push(
                Bucket::Low,
                Vulnerability {
                    severity: "Low".to_string(),
                    title: "Error running Security Code Scan Tool.".to_string(),
                    details: "Security Code Scan could not build the project. Check that the solution compiles with dotnet build.".to_string(),
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
            return Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning));
        }

        let log: SarifLog = from_json(self.tool(), raw)?;
        for result in log.runs.into_iter().flat_map(|run| run.results) {
            let (bucket, severity) = severity_for(&result.level);
            let location = result
                .locations
                .into_iter()
                .next()
                .map(|l| l.physical_location)
                .unwrap_or_default();
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    severity: severity.to_string(),
                    kind: result.rule_id.clone(),
                    title: result.rule_id,
                    details: result.message.text,
                    file: relative_path(&location.artifact_location.uri),
                    line: location.region.start_line.to_string(),
                    code: line_span(location.region.start_line, location.region.end_line),
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}
