//! Safety analyzer
//!
//! Safety prints "unpinned requirement" warnings on the lines before its JSON
//! report; each warning becomes a low finding.

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};
use crate::util::text::{adjust_warning_message, all_lines_but_last, last_line, sanitize_safety_json};

const RUNNING_SENTINEL: &str = "ERROR_RUNNING_SAFETY";
const REQUIREMENTS_MISSING: &str = "ERROR_REQ_NOT_FOUND";
const UNPINNED_WARNING: &str = "Warning: unpinned requirement ";

#[derive(Debug, Deserialize)]
struct SafetyOutput {
    #[serde(default)]
    issues: Vec<SafetyIssue>,
}

#[derive(Debug, Deserialize)]
struct SafetyIssue {
    #[serde(default)]
    dependency: String,
    #[serde(default)]
    vulnerable_below: String,
    #[serde(default)]
    installed_version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    id: String,
}

pub struct SafetyAnalyzer;

impl SafetyAnalyzer {
    fn low(&self, title: &str, details: String) -> Vulnerability {
        Vulnerability {
            severity: "low".to_string(),
            confidence: "high".to_string(),
            title: title.to_string(),
            details,
            ..Vulnerability::new(self.language(), self.tool())
        }
    }
}

impl OutputAnalyzer for SafetyAnalyzer {
    fn scanner(&self) -> &'static str {
        "safety"
    }

    fn tool(&self) -> &'static str {
        "Safety"
    }

    fn language(&self) -> &'static str {
        "Python"
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

        let mut vulnerabilities = SecurityTestOutput::default();
        if raw.contains(REQUIREMENTS_MISSING) {
            vulnerabilities.push(
                Bucket::Low,
                self.low(
                    "No requirements.txt found.",
                    "It looks like your project doesn't have a requirements.txt file. Safety needs it to check your dependencies.".to_string(),
                ),
            );
            return Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning));
        }

        let trimmed = raw.trim();
        let report = if trimmed.contains(UNPINNED_WARNING) {
            for warning in all_lines_but_last(trimmed) {
                if warning.trim().is_empty() {
                    continue;
                }
                vulnerabilities.push(
                    Bucket::Low,
                    self.low("Safety scan warning.", adjust_warning_message(warning)),
                );
            }
            last_line(trimmed)
        } else {
            trimmed
        };

        let output: SafetyOutput = from_json(self.tool(), &sanitize_safety_json(report))?;
        for issue in output.issues {
            vulnerabilities.push(
                Bucket::High,
                Vulnerability {
                    severity: "high".to_string(),
                    confidence: "high".to_string(),
                    title: format!(
                        "Vulnerable Dependency: {} ({})",
                        issue.dependency, issue.vulnerable_below
                    ),
                    code: format!("{} {}", issue.dependency, issue.installed_version),
                    details: issue.description,
                    kind: issue.id,
                    vulnerable_below: issue.vulnerable_below,
                    version: issue.installed_version,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUE: &str = r#"{"issues":[{"dependency":"django","vulnerable_below":"<1.11.29","installed_version":"1.11.0","description":"Django before 1.11.29 allows SQL injection","id":"38010"}]}"#;

    #[test]
    fn test_issues_are_high() {
        let outcome = SafetyAnalyzer.analyze(ISSUE).unwrap();

        assert_eq!(outcome.result, ScanResult::Failed);
        let vuln = &outcome.vulnerabilities.high[0];
        assert_eq!(vuln.title, "Vulnerable Dependency: django (<1.11.29)");
        assert_eq!(vuln.code, "django 1.11.0");
    }

    #[test]
    fn test_unpinned_warnings_precede_report() {
        let raw = format!(
            "Warning: unpinned requirement 'flask' found in safety_scanfleet_requirements_raw.txt, unable to check.\n{}",
            r#"{"issues":[]}"#
        );
        let outcome = SafetyAnalyzer.analyze(&raw).unwrap();

        assert_eq!(outcome.result, ScanResult::Warning);
        assert_eq!(outcome.vulnerabilities.low.len(), 1);
        let vuln = &outcome.vulnerabilities.low[0];
        assert_eq!(vuln.title, "Safety scan warning.");
        assert!(vuln.details.contains("'requirements.txt'"));
    }

    #[test]
    fn test_requirements_missing() {
        let outcome = SafetyAnalyzer.analyze("ERROR_REQ_NOT_FOUND").unwrap();
        assert_eq!(outcome.result, ScanResult::Warning);
        assert_eq!(outcome.vulnerabilities.low[0].title, "No requirements.txt found.");
    }

    #[test]
    fn test_running_sentinel_is_tool_failure() {
        let err = SafetyAnalyzer.analyze("ERROR_RUNNING_SAFETY").unwrap_err();
        assert_eq!(err.info(), "Internal error running Safety.");
    }

    #[test]
    fn test_backslashes_in_description_survive() {
        let raw = r#"{"issues":[{"dependency":"pyyaml","vulnerable_below":"<5.1","installed_version":"3.13","description":"load() on C:\data is unsafe","id":"36333"}]}"#;
        let outcome = SafetyAnalyzer.analyze(raw).unwrap();
        assert!(outcome.vulnerabilities.high[0].details.contains(r"C:\data"));
    }
}
