//! Scanner definition registry
//!
//! Holds every known `SecurityTest` and answers the lookups the fan-out needs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{ScannerScope, SecurityTest};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read scanner definitions from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scanner definitions: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Duplicate scanner definition: {0}")]
    Duplicate(String),

    #[error("Invalid scanner '{name}': {reason}")]
    Invalid { name: String, reason: String },

    #[error("No scanner found for {0}")]
    NotFound(String),
}

/// Filter over scanner definitions; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerQuery {
    pub name: Option<String>,
    pub scope: Option<ScannerScope>,
    pub language: Option<String>,
    pub default_only: bool,
}

impl ScannerQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Default-enabled scanners that run for every repository
    pub fn generic_defaults() -> Self {
        Self {
            scope: Some(ScannerScope::Generic),
            default_only: true,
            ..Default::default()
        }
    }

    /// Default-enabled scanners for one detected language
    pub fn language_defaults(language: impl Into<String>) -> Self {
        Self {
            scope: Some(ScannerScope::Language),
            language: Some(language.into()),
            default_only: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, test: &SecurityTest) -> bool {
        self.name.as_deref().map_or(true, |n| test.name == n)
            && self.scope.map_or(true, |s| test.scope == s)
            && self
                .language
                .as_deref()
                .map_or(true, |l| test.language.eq_ignore_ascii_case(l))
            && (!self.default_only || test.default_enabled)
    }
}

#[derive(Debug, Deserialize)]
struct ScannersFile {
    #[serde(default)]
    scanners: Vec<SecurityTest>,
}

#[derive(Debug, Clone, Default)]
pub struct ScannerRegistry {
    scanners: Vec<SecurityTest>,
}

impl ScannerRegistry {
    /// Builds a registry, rejecting duplicate names and incomplete definitions
    pub fn new(scanners: Vec<SecurityTest>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for test in &scanners {
            validate(test)?;
            if !seen.insert(test.name.clone()) {
                return Err(RegistryError::Duplicate(test.name.clone()));
            }
        }
        Ok(Self { scanners })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let file: ScannersFile = serde_yaml::from_str(yaml)?;
        Self::new(file.scanners)
    }

    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_yaml(&yaml)?;
        debug!(
            path = %path.display(),
            count = registry.len(),
            "Loaded scanner definitions"
        );
        Ok(registry)
    }

    pub fn get_by_name(&self, name: &str) -> Result<&SecurityTest, RegistryError> {
        self.scanners
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| RegistryError::NotFound(format!("name '{}'", name)))
    }

    pub fn get_all_by_language(&self, language: &str) -> Result<Vec<&SecurityTest>, RegistryError> {
        let found: Vec<_> = self
            .scanners
            .iter()
            .filter(|t| t.language.eq_ignore_ascii_case(language))
            .collect();
        if found.is_empty() {
            return Err(RegistryError::NotFound(format!("language '{}'", language)));
        }
        Ok(found)
    }

    pub fn get_all_by_type(&self, scope: ScannerScope) -> Result<Vec<&SecurityTest>, RegistryError> {
        let found: Vec<_> = self.scanners.iter().filter(|t| t.scope == scope).collect();
        if found.is_empty() {
            return Err(RegistryError::NotFound(format!("type '{}'", scope)));
        }
        Ok(found)
    }

    /// Every definition matching `query`, possibly none
    pub fn query(&self, query: &ScannerQuery) -> Vec<SecurityTest> {
        self.scanners
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> &[SecurityTest] {
        &self.scanners
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

fn validate(test: &SecurityTest) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::Invalid {
        name: test.name.clone(),
        reason: reason.to_string(),
    };

    if test.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if test.image.trim().is_empty() {
        return Err(invalid("image is empty"));
    }
    if test.command.trim().is_empty() {
        return Err(invalid("cmd is empty"));
    }
    if test.scope == ScannerScope::Language && test.language.trim().is_empty() {
        return Err(invalid("language scanners need a language"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
scanners:
  - name: enry
    image: scanfleet/enry
    cmd: enry --json code
    type: Generic
    default: false
    timeOutSeconds: 60
  - name: gitleaks
    image: zricethezav/gitleaks
    imageTag: v4.1.0
    cmd: gitleaks --repo-path=code --report=/dev/stdout
    type: Generic
    default: true
    timeOutSeconds: 360
  - name: gosec
    image: securego/gosec
    cmd: gosec -fmt=json ./...
    type: Language
    language: Go
    default: true
    timeOutSeconds: 360
  - name: bandit
    image: scanfleet/bandit
    cmd: bandit -r code -f json
    type: Language
    language: Python
    default: true
    timeOutSeconds: 360
  - name: safety
    image: scanfleet/safety
    cmd: safety check --json
    type: Language
    language: Python
    default: false
    timeOutSeconds: 360
"#;

    #[test]
    fn test_from_yaml() {
        let registry = ScannerRegistry::from_yaml(YAML).unwrap();
        assert_eq!(registry.len(), 5);

        let gitleaks = registry.get_by_name("gitleaks").unwrap();
        assert_eq!(gitleaks.tag(), "v4.1.0");
        assert!(gitleaks.is_generic());
    }

    #[test]
    fn test_lookups() {
        let registry = ScannerRegistry::from_yaml(YAML).unwrap();

        assert_eq!(registry.get_all_by_language("python").unwrap().len(), 2);
        assert_eq!(registry.get_all_by_type(ScannerScope::Generic).unwrap().len(), 2);
        assert!(matches!(
            registry.get_all_by_language("Ruby"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.get_by_name("brakeman"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_query_respects_default_flag() {
        let registry = ScannerRegistry::from_yaml(YAML).unwrap();

        let generic: Vec<_> = registry
            .query(&ScannerQuery::generic_defaults())
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(generic, vec!["gitleaks"]);

        let python: Vec<_> = registry
            .query(&ScannerQuery::language_defaults("Python"))
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(python, vec!["bandit"]);

        assert_eq!(registry.query(&ScannerQuery::by_name("safety")).len(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = r#"
scanners:
  - {name: gosec, image: a, cmd: x, type: Language, language: Go, timeOutSeconds: 1}
  - {name: gosec, image: b, cmd: y, type: Language, language: Go, timeOutSeconds: 1}
"#;
        assert!(matches!(
            ScannerRegistry::from_yaml(yaml),
            Err(RegistryError::Duplicate(name)) if name == "gosec"
        ));
    }

    #[test]
    fn test_language_scanner_without_language_rejected() {
        let yaml = r#"
scanners:
  - {name: gosec, image: a, cmd: x, type: Language, timeOutSeconds: 1}
"#;
        assert!(matches!(
            ScannerRegistry::from_yaml(yaml),
            Err(RegistryError::Invalid { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let registry = ScannerRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.len(), 5);

        let missing = ScannerRegistry::from_file(Path::new("/nonexistent/scanners.yaml"));
        assert!(matches!(missing, Err(RegistryError::Io { .. })));
    }
}
