//! Analyzer registry integration tests
//!
//! Drives every registered analyzer through `AnalyzerRegistry::analyze` with
//! representative tool output, the shared preconditions and malformed input.

use scanfleet::analyzers::{AnalyzerError, AnalyzerRegistry, Artifacts};
use scanfleet::model::ScanResult;
use yare::parameterized;

const SCANNERS: &[&str] = &[
    "enry",
    "gitauthors",
    "gitleaks",
    "gosec",
    "bandit",
    "safety",
    "brakeman",
    "npmaudit",
    "yarnaudit",
    "tfsec",
    "securitycodescan",
    "infer",
    "spotbugs",
];

fn registry() -> AnalyzerRegistry {
    AnalyzerRegistry::with_defaults()
}

#[test]
fn test_every_scanner_has_an_analyzer() {
    let registry = registry();
    for scanner in SCANNERS {
        assert!(registry.get(scanner).is_some(), "missing analyzer for {}", scanner);
    }
    assert_eq!(registry.len(), SCANNERS.len());
}

#[test]
fn test_cloning_sentinel_wins_for_every_scanner() {
    let registry = registry();
    for scanner in SCANNERS {
        let result = registry.analyze(scanner, "ERROR_CLONING\nfatal: could not read Username");
        assert!(
            matches!(result, Err(AnalyzerError::Cloning)),
            "{} did not report the cloning error",
            scanner
        );
    }
}

#[parameterized(
    gitleaks = { "gitleaks" },
    gosec = { "gosec" },
    bandit = { "bandit" },
    safety = { "safety" },
    brakeman = { "brakeman" },
    npmaudit = { "npmaudit" },
    yarnaudit = { "yarnaudit" },
    tfsec = { "tfsec" },
    securitycodescan = { "securitycodescan" },
    infer = { "infer" },
    spotbugs = { "spotbugs" },
)]
fn test_blank_output_passes(scanner: &str) {
    let outcome = registry().analyze(scanner, "  \n").unwrap();
    assert_eq!(outcome.result, ScanResult::Passed);
    assert!(outcome.vulnerabilities.is_empty());
}

#[parameterized(
    gosec_high = {
        "gosec",
        r#"{"Issues":[{"severity":"HIGH","confidence":"HIGH","rule_id":"G101","details":"Potential hardcoded credentials","file":"config.go","code":"password := \"x\"","line":"7"}],"Stats":{}}"#,
        ScanResult::Failed
    },
    gosec_low = {
        "gosec",
        r#"{"Issues":[{"severity":"LOW","confidence":"HIGH","rule_id":"G104","details":"Errors unhandled","file":"main.go","code":"f.Close()","line":"30"}],"Stats":{}}"#,
        ScanResult::Warning
    },
    safety_vulnerable = {
        "safety",
        r#"{"issues":[{"dependency":"django","vulnerable_below":"<1.11.29","installed_version":"1.11.0","description":"SQL injection","id":"38010"}]}"#,
        ScanResult::Failed
    },
    safety_missing_requirements = { "safety", "ERROR_REQ_NOT_FOUND", ScanResult::Warning },
    npmaudit_no_lockfile = { "npmaudit", r#"{"advisories":{},"failed_running":true}"#, ScanResult::Warning },
    yarnaudit_no_lockfile = { "yarnaudit", "ERROR_YARN_LOCK_NOT_FOUND", ScanResult::Warning },
    tfsec_null = { "tfsec", r#"{"results":null}"#, ScanResult::Passed },
    gitleaks_empty = { "gitleaks", "[]", ScanResult::Passed },
    infer_empty = { "infer", "[]", ScanResult::Passed },
    securitycodescan_no_runs = { "securitycodescan", r#"{"runs":[]}"#, ScanResult::Passed },
    spotbugs_no_bugs = { "spotbugs", r#"<?xml version="1.0"?><BugCollection version="4.0.0"></BugCollection>"#, ScanResult::Passed },
)]
fn test_result_classification(scanner: &str, raw: &str, expected: ScanResult) {
    let outcome = registry().analyze(scanner, raw).unwrap();
    assert_eq!(outcome.result, expected);
}

#[parameterized(
    gosec = { "gosec", "panic: runtime error" },
    tfsec = { "tfsec", "{\"results\": [" },
    brakeman = { "brakeman", "not json at all" },
    spotbugs = { "spotbugs", "<BugCollection><BugInstance>" },
    enry = { "enry", "Go: 100%" },
    gitauthors = { "gitauthors", "fatal: not a git repository" },
    gitleaks = { "gitleaks", "[{\"rule\":" },
    bandit = { "bandit", "Run started:2024-01-01 10:00:00" },
    safety = { "safety", "Traceback (most recent call last):" },
    npmaudit = { "npmaudit", "npm ERR! code ENOLOCK" },
    yarnaudit = { "yarnaudit", "yarn audit v1.22.19" },
    securitycodescan = { "securitycodescan", "MSBUILD : error MSB1003" },
    infer = { "infer", r#"{"bug_type":"NULL_DEREFERENCE"}"# },
)]
fn test_malformed_output(scanner: &str, raw: &str) {
    let err = registry().analyze(scanner, raw).unwrap_err();
    assert!(matches!(err, AnalyzerError::Malformed { .. }));
    assert_eq!(err.raw_output(), Some(raw));
    assert!(!err.is_scanner_local());
}

#[test]
fn test_tool_failures_are_scanner_local() {
    let registry = registry();
    for (scanner, raw) in [
        ("npmaudit", "ERROR_RUNNING_NPMAUDIT"),
        ("safety", "ERROR_RUNNING_SAFETY"),
    ] {
        let err = registry.analyze(scanner, raw).unwrap_err();
        assert!(err.is_scanner_local(), "{} failure should stay local", scanner);
        assert!(err.info().starts_with("Internal error running"));
    }
}

#[test]
fn test_language_detector_artifacts() {
    let outcome = registry()
        .analyze("enry", r#"{"Python":["app.py"],"JavaScript":["web/index.js"]}"#)
        .unwrap();

    let Artifacts::Codes(codes) = outcome.artifacts else {
        panic!("expected detected languages");
    };
    let languages: Vec<_> = codes.iter().map(|c| c.language.as_str()).collect();
    assert_eq!(languages, vec!["JavaScript", "Python"]);
}

#[test]
fn test_commit_authors_artifacts() {
    let outcome = registry()
        .analyze("gitauthors", r#"{"authors":["dev@example.com","ops@example.com"]}"#)
        .unwrap();
    assert_eq!(
        outcome.artifacts,
        Artifacts::CommitAuthors(vec![
            "dev@example.com".to_string(),
            "ops@example.com".to_string()
        ])
    );
}

#[test]
fn test_unknown_scanner() {
    assert!(matches!(
        registry().analyze("sonarqube", "{}"),
        Err(AnalyzerError::UnknownScanner(name)) if name == "sonarqube"
    ));
}
