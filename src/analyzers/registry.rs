//! Analyzer registry
//!
//! Maps scanner names to their output analyzers.

use std::sync::Arc;

use super::error::AnalyzerError;
use super::outcome::ScanOutcome;
use super::trait_def::OutputAnalyzer;
use super::*;

/// Registry of output analyzers keyed by scanner name
#[derive(Clone)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Arc<dyn OutputAnalyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Registry with every built-in analyzer
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EnryAnalyzer));
        registry.register(Arc::new(GitAuthorsAnalyzer));
        registry.register(Arc::new(GitleaksAnalyzer));
        registry.register(Arc::new(GosecAnalyzer));
        registry.register(Arc::new(BanditAnalyzer));
        registry.register(Arc::new(SafetyAnalyzer));
        registry.register(Arc::new(BrakemanAnalyzer));
        registry.register(Arc::new(NpmAuditAnalyzer));
        registry.register(Arc::new(YarnAuditAnalyzer));
        registry.register(Arc::new(TfsecAnalyzer));
        registry.register(Arc::new(SecurityCodeScanAnalyzer));
        registry.register(Arc::new(InferAnalyzer));
        registry.register(Arc::new(SpotBugsAnalyzer));
        registry
    }

    /// Registers an analyzer, replacing any previous one for the same scanner
    pub fn register(&mut self, analyzer: Arc<dyn OutputAnalyzer>) {
        self.analyzers.retain(|a| a.scanner() != analyzer.scanner());
        self.analyzers.push(analyzer);
    }

    pub fn get(&self, scanner: &str) -> Option<Arc<dyn OutputAnalyzer>> {
        self.analyzers
            .iter()
            .find(|a| a.scanner() == scanner)
            .cloned()
    }

    /// Runs the analyzer registered for `scanner`
    pub fn analyze(&self, scanner: &str, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        let analyzer = self
            .get(scanner)
            .ok_or_else(|| AnalyzerError::UnknownScanner(scanner.to_string()))?;
        analyzer.analyze(raw)
    }

    pub fn scanner_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.scanner()).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScanResult;

    struct AlwaysWarns;

    impl OutputAnalyzer for AlwaysWarns {
        fn scanner(&self) -> &'static str {
            "gosec"
        }
        fn tool(&self) -> &'static str {
            "FakeGoSec"
        }
        fn language(&self) -> &'static str {
            "Go"
        }
        fn analyze(&self, _raw: &str) -> Result<ScanOutcome, AnalyzerError> {
            Ok(ScanOutcome::new(
                ScanResult::Warning,
                "fake",
                Default::default(),
            ))
        }
    }

    #[test]
    fn test_defaults_cover_all_scanners() {
        let registry = AnalyzerRegistry::with_defaults();
        assert_eq!(registry.len(), 13);
        for name in [
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
        ] {
            assert!(registry.get(name).is_some(), "missing analyzer for {}", name);
        }
    }

    #[test]
    fn test_unknown_scanner() {
        let registry = AnalyzerRegistry::with_defaults();
        let err = registry.analyze("retirejs", "").unwrap_err();
        assert!(matches!(err, AnalyzerError::UnknownScanner(name) if name == "retirejs"));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = AnalyzerRegistry::with_defaults();
        let before = registry.len();
        registry.register(Arc::new(AlwaysWarns));

        assert_eq!(registry.len(), before);
        assert_eq!(registry.get("gosec").unwrap().tool(), "FakeGoSec");
        let outcome = registry.analyze("gosec", "anything").unwrap();
        assert_eq!(outcome.result, ScanResult::Warning);
    }

    #[test]
    fn test_empty_registry() {
        let registry = AnalyzerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.scanner_names().is_empty());
    }
}
