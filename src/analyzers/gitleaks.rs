//! Gitleaks analyzer
//!
//! Any committed secret fails the run. Severity comes from the rule that matched.

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, ScanOutcome, INFO_ISSUES};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

/// Dependency directories whose leaks are not the repository's own
const SKIPPED_PREFIXES: &[&str] = &["vendor/", "node_modules/"];

const HIGH_RULES: &[&str] = &["PKCS8", "RSA", "SSH", "PGP", "EC"];

const MEDIUM_RULES: &[&str] = &[
    "AWS Secret Key",
    "Facebook Secret Key",
    "Facebook access token",
    "Twitter Secret Key",
    "LinkedIn Secret Key",
    "Google OAuth access token",
    "Google Cloud Platform API key",
    "Heroku API key",
    "MailChimp API key",
    "Mailgun API key",
    "PayPal Braintree access token",
    "Picatic API key",
    "Stripe API key",
    "Twilio API key",
];

#[derive(Debug, Deserialize)]
struct Leak {
    #[serde(default)]
    line: String,
    #[serde(default)]
    commit: String,
    #[serde(default)]
    rule: String,
    #[serde(default)]
    file: String,
}

fn severity_for(rule: &str) -> (Bucket, &'static str) {
    if HIGH_RULES.contains(&rule) {
        (Bucket::High, "HIGH")
    } else if MEDIUM_RULES.contains(&rule) {
        (Bucket::Medium, "MEDIUM")
    } else {
        (Bucket::Low, "LOW")
    }
}

pub struct GitleaksAnalyzer;

impl OutputAnalyzer for GitleaksAnalyzer {
    fn scanner(&self) -> &'static str {
        "gitleaks"
    }

    fn tool(&self) -> &'static str {
        "GitLeaks"
    }

    fn language(&self) -> &'static str {
        "Generic"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let leaks: Option<Vec<Leak>> = from_json(self.tool(), raw)?;
        let mut vulnerabilities = SecurityTestOutput::default();
        for leak in leaks.unwrap_or_default() {
            if SKIPPED_PREFIXES.iter().any(|p| leak.file.starts_with(p)) {
                continue;
            }
            let (bucket, severity) = severity_for(&leak.rule);
            vulnerabilities.push(
                bucket,
                Vulnerability {
                    severity: severity.to_string(),
                    details: format!("{} @ [{}]", leak.rule, leak.commit),
                    title: leak.rule,
                    file: leak.file,
                    code: leak.line,
                    ..Vulnerability::new(self.language(), self.tool())
                },
            );
        }

        if vulnerabilities.is_empty() {
            return Ok(ScanOutcome::clean());
        }
        Ok(ScanOutcome::new(ScanResult::Failed, INFO_ISSUES, vulnerabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak(rule: &str, file: &str) -> String {
        format!(
            r#"{{"line":"key = AKIA...","commit":"a1b2c3","offender":"AKIA...","rule":"{}","info":"","commitMsg":"oops","author":"dev","email":"dev@example.com","file":"{}","repo":"app","date":"2020-01-01T00:00:00Z","tags":"key","severity":""}}"#,
            rule, file
        )
    }

    #[test]
    fn test_rule_severity_mapping() {
        let raw = format!(
            "[{},{},{}]",
            leak("RSA", "keys/id_rsa"),
            leak("Stripe API key", "config/app.yml"),
            leak("Generic Credential", "src/main.go")
        );
        let outcome = GitleaksAnalyzer.analyze(&raw).unwrap();

        assert_eq!(outcome.result, ScanResult::Failed);
        assert_eq!(outcome.vulnerabilities.high.len(), 1);
        assert_eq!(outcome.vulnerabilities.medium.len(), 1);
        assert_eq!(outcome.vulnerabilities.low.len(), 1);
        assert_eq!(outcome.vulnerabilities.high[0].details, "RSA @ [a1b2c3]");
        assert_eq!(outcome.vulnerabilities.high[0].code, "key = AKIA...");
    }

    #[test]
    fn test_low_leak_still_fails() {
        let raw = format!("[{}]", leak("Generic Credential", "src/main.go"));
        let outcome = GitleaksAnalyzer.analyze(&raw).unwrap();
        assert_eq!(outcome.result, ScanResult::Failed);
    }

    #[test]
    fn test_dependency_directories_are_skipped() {
        let raw = format!(
            "[{},{}]",
            leak("RSA", "vendor/github.com/x/key.pem"),
            leak("RSA", "node_modules/pkg/key.pem")
        );
        let outcome = GitleaksAnalyzer.analyze(&raw).unwrap();
        assert_eq!(outcome.result, ScanResult::Passed);
        assert!(outcome.vulnerabilities.is_empty());
    }

    #[test]
    fn test_empty_report_passes() {
        for raw in ["[]", "null"] {
            let outcome = GitleaksAnalyzer.analyze(raw).unwrap();
            assert_eq!(outcome.result, ScanResult::Passed);
        }
    }
}
