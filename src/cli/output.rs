//! Output formatting for multiple formats
//!
//! Renders analyses, single analyzer outcomes, scanner listings, health and
//! configuration as JSON, YAML or human-readable text.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analyzers::{Artifacts, ScanOutcome};
use crate::config::ScanfleetConfig;
use crate::model::{Analysis, Code, ScanResult, SecurityTest, SecurityTestOutput, Vulnerability};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Serializable view of one analyzer run
#[derive(Debug, Serialize)]
pub struct OutcomeReport<'a> {
    pub scanner: &'a str,
    pub result: ScanResult,
    pub info: &'a str,
    pub vulnerabilities: &'a SecurityTestOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codes: Option<&'a [Code]>,
    #[serde(rename = "commitAuthors", skip_serializing_if = "Option::is_none")]
    pub commit_authors: Option<&'a [String]>,
}

impl<'a> OutcomeReport<'a> {
    pub fn new(scanner: &'a str, outcome: &'a ScanOutcome) -> Self {
        let (codes, commit_authors) = match &outcome.artifacts {
            Artifacts::Codes(codes) => (Some(codes.as_slice()), None),
            Artifacts::CommitAuthors(authors) => (None, Some(authors.as_slice())),
            Artifacts::None => (None, None),
        };
        Self {
            scanner,
            result: outcome.result,
            info: &outcome.info,
            vulnerabilities: &outcome.vulnerabilities,
            codes,
            commit_authors,
        }
    }
}

/// Health status for the container engine
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub available: bool,
    pub message: String,
    pub details: Option<String>,
}

impl HealthStatus {
    pub fn available(message: String) -> Self {
        Self {
            available: true,
            message,
            details: None,
        }
    }

    pub fn unavailable(message: String) -> Self {
        Self {
            available: false,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_analysis(&self, analysis: &Analysis) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(analysis, "analysis"),
            OutputFormat::Yaml => to_yaml(analysis, "analysis"),
            OutputFormat::Human => Ok(self.format_analysis_human(analysis)),
        }
    }

    pub fn format_outcome(&self, scanner: &str, outcome: &ScanOutcome) -> Result<String> {
        let report = OutcomeReport::new(scanner, outcome);
        match self.format {
            OutputFormat::Json => to_json(&report, "scan outcome"),
            OutputFormat::Yaml => to_yaml(&report, "scan outcome"),
            OutputFormat::Human => Ok(self.format_outcome_human(&report)),
        }
    }

    pub fn format_scanners(&self, scanners: &[SecurityTest]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&scanners, "scanners"),
            OutputFormat::Yaml => to_yaml(&scanners, "scanners"),
            OutputFormat::Human => Ok(self.format_scanners_human(scanners)),
        }
    }

    pub fn format_health(&self, status: &HealthStatus) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(status, "health status"),
            OutputFormat::Yaml => to_yaml(status, "health status"),
            OutputFormat::Human => Ok(self.format_health_human(status)),
        }
    }

    pub fn format_config(&self, config: &ScanfleetConfig) -> Result<String> {
        let config_map = config.to_display_map();
        match self.format {
            OutputFormat::Json => to_json(&config_map, "config"),
            OutputFormat::Yaml => to_yaml(&config_map, "config"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_analysis_human(&self, analysis: &Analysis) -> String {
        let mut output = String::new();

        let symbol = match analysis.result {
            Some(ScanResult::Passed) => "\u{2713}",
            Some(ScanResult::Warning) => "\u{26A0}",
            _ => "\u{2717}",
        };
        output.push_str(&format!("{} Analysis {}\n", symbol, analysis.rid));
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Repository:  {}\n", analysis.url));
        output.push_str(&format!("Branch:      {}\n", analysis.branch));
        output.push_str(&format!("Status:      {}\n", analysis.status));
        output.push_str(&format!(
            "Result:      {}\n",
            analysis
                .result
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
        if !analysis.error_found.is_empty() {
            output.push_str(&format!("Error:       {}\n", analysis.error_found));
        }

        if !analysis.codes.is_empty() {
            let languages: Vec<_> = analysis.codes.iter().map(|c| c.language.as_str()).collect();
            output.push_str(&format!("Languages:   {}\n", languages.join(", ")));
        }
        output.push('\n');

        output.push_str("Containers:\n");
        for (i, container) in analysis.containers.iter().enumerate() {
            let connector = if i + 1 == analysis.containers.len() {
                "\u{2514}"
            } else {
                "\u{251C}"
            };
            output.push_str(&format!(
                "{}\u{2500} {:<18} {:<9} {:<8} {}\n",
                connector,
                container.scanner(),
                container.status.to_string(),
                container
                    .result
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                container.info
            ));
        }

        if !analysis.results.is_empty() {
            output.push_str("\nFindings:\n");
            for (language, tool, findings) in analysis.results.iter() {
                output.push_str(&format!(
                    "  {} / {}: {} high, {} medium, {} low, {} nosec\n",
                    language,
                    tool,
                    findings.high.len(),
                    findings.medium.len(),
                    findings.low.len(),
                    findings.nosec.len()
                ));
                for vuln in findings.high.iter().chain(&findings.medium) {
                    output.push_str(&format!("    - {}\n", describe(vuln)));
                }
            }
        }

        if !analysis.commit_authors.is_empty() {
            output.push_str(&format!(
                "\nCommit authors: {}\n",
                analysis.commit_authors.join(", ")
            ));
        }

        output
    }

    fn format_outcome_human(&self, report: &OutcomeReport<'_>) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}: {} ({})\n", report.scanner, report.result, report.info));

        let buckets = [
            ("High", &report.vulnerabilities.high),
            ("Medium", &report.vulnerabilities.medium),
            ("Low", &report.vulnerabilities.low),
            ("NoSec", &report.vulnerabilities.nosec),
        ];
        for (label, vulns) in buckets {
            if vulns.is_empty() {
                continue;
            }
            output.push_str(&format!("\n{} ({}):\n", label, vulns.len()));
            for vuln in vulns {
                output.push_str(&format!("  - {}\n", describe(vuln)));
            }
        }

        if let Some(codes) = report.codes {
            output.push_str("\nLanguages:\n");
            for code in codes {
                output.push_str(&format!("  {} ({} files)\n", code.language, code.files.len()));
            }
        }
        if let Some(authors) = report.commit_authors {
            output.push_str(&format!("\nCommit authors: {}\n", authors.join(", ")));
        }
        output
    }

    fn format_scanners_human(&self, scanners: &[SecurityTest]) -> String {
        let mut output = String::new();
        output.push_str("Registered Scanners\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        for test in scanners {
            let scope = if test.is_generic() {
                test.scope.to_string()
            } else {
                format!("{} ({})", test.scope, test.language)
            };
            let default_marker = if test.default_enabled { "*" } else { " " };
            output.push_str(&format!(
                "{} {:<18} {:<22} {}s  {}\n",
                default_marker,
                test.name,
                scope,
                test.timeout_secs,
                test.image_reference()
            ));
        }
        output.push_str("\n* = runs by default\n");
        output
    }

    fn format_health_human(&self, status: &HealthStatus) -> String {
        let mut output = String::new();
        output.push_str("Container Engine Health\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        let symbol = if status.available { "\u{2713}" } else { "\u{2717}" };
        output.push_str(&format!(
            "{} {}\n",
            symbol,
            if status.available { "Available" } else { "Unavailable" }
        ));
        output.push_str(&format!("  Message: {}\n", status.message));
        if let Some(ref details) = status.details {
            output.push_str(&format!("  Details: {}\n", details));
        }
        output
    }
}

fn describe(vuln: &Vulnerability) -> String {
    let mut text = if vuln.title.is_empty() {
        vuln.details.clone()
    } else {
        vuln.title.clone()
    };
    if !vuln.file.is_empty() {
        text.push_str(&format!(" [{}", vuln.file));
        if !vuln.line.is_empty() {
            text.push_str(&format!(":{}", vuln.line));
        }
        text.push(']');
    }
    text
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bucket, Container, ScannerScope};

    fn gosec() -> SecurityTest {
        SecurityTest {
            name: "gosec".to_string(),
            image: "securego/gosec".to_string(),
            image_tag: "v2.4.0".to_string(),
            command: "gosec ./...".to_string(),
            scope: ScannerScope::Language,
            language: "Go".to_string(),
            default_enabled: true,
            timeout_secs: 360,
        }
    }

    fn finished_analysis() -> Analysis {
        let mut analysis = Analysis::new("rid-1", "https://github.com/org/app.git", "main");
        let mut container = Container::new(gosec());
        container.result = Some(ScanResult::Failed);
        container.info = "Issues found.".to_string();
        analysis.containers.push(container);
        analysis.result = Some(ScanResult::Failed);

        let mut vuln = Vulnerability::new("Go", "GoSec");
        vuln.details = "Use of weak random number generator".to_string();
        vuln.file = "main.go".to_string();
        vuln.line = "12".to_string();
        let mut output = SecurityTestOutput::default();
        output.push(Bucket::High, vuln);
        analysis.results.merge("Go", "GoSec", output);
        analysis
    }

    #[test]
    fn test_analysis_json_uses_wire_names() {
        let json = OutputFormatter::new(OutputFormat::Json)
            .format_analysis(&finished_analysis())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["RID"], "rid-1");
        assert_eq!(value["result"], "failed");
        assert_eq!(value["containers"][0]["cResult"], "failed");
    }

    #[test]
    fn test_analysis_human() {
        let text = OutputFormatter::new(OutputFormat::Human)
            .format_analysis(&finished_analysis())
            .unwrap();
        assert!(text.contains("Analysis rid-1"));
        assert!(text.contains("gosec"));
        assert!(text.contains("Go / GoSec: 1 high"));
        assert!(text.contains("[main.go:12]"));
    }

    #[test]
    fn test_outcome_yaml_includes_codes() {
        let outcome = ScanOutcome::clean().with_artifacts(Artifacts::Codes(vec![Code {
            language: "Go".to_string(),
            files: vec!["main.go".to_string()],
        }]));
        let yaml = OutputFormatter::new(OutputFormat::Yaml)
            .format_outcome("enry", &outcome)
            .unwrap();
        assert!(yaml.contains("scanner: enry"));
        assert!(yaml.contains("language: Go"));
        assert!(!yaml.contains("commitAuthors"));
    }

    #[test]
    fn test_scanners_human_marks_defaults() {
        let text = OutputFormatter::new(OutputFormat::Human)
            .format_scanners(&[gosec()])
            .unwrap();
        assert!(text.contains("* gosec"));
        assert!(text.contains("Language (Go)"));
        assert!(text.contains("securego/gosec:v2.4.0"));
    }

    #[test]
    fn test_health_human() {
        let status = HealthStatus::unavailable("Cannot connect".to_string())
            .with_details("Is the engine running?".to_string());
        let text = OutputFormatter::new(OutputFormat::Human)
            .format_health(&status)
            .unwrap();
        assert!(text.contains("Unavailable"));
        assert!(text.contains("Details: Is the engine running?"));
    }
}
