use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_IMAGE_TAG: &str = "latest";

/// Whether a scanner runs for every repository or only for matching languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScannerScope {
    Generic,
    Language,
}

impl fmt::Display for ScannerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerScope::Generic => f.write_str("Generic"),
            ScannerScope::Language => f.write_str("Language"),
        }
    }
}

/// A registered scanner definition
///
/// Read-only during an analysis. `name` is the unique key and also selects the
/// output analyzer that interprets the container's stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityTest {
    pub name: String,

    pub image: String,

    #[serde(rename = "imageTag", default)]
    pub image_tag: String,

    /// Shell command template with `%GIT_REPO%`-style placeholders
    #[serde(rename = "cmd")]
    pub command: String,

    #[serde(rename = "type")]
    pub scope: ScannerScope,

    /// Empty for generic scanners
    #[serde(default)]
    pub language: String,

    #[serde(rename = "default", default)]
    pub default_enabled: bool,

    #[serde(rename = "timeOutSeconds")]
    pub timeout_secs: u64,
}

impl SecurityTest {
    /// Tag to pull, falling back to `latest`
    pub fn tag(&self) -> &str {
        if self.image_tag.is_empty() {
            DEFAULT_IMAGE_TAG
        } else {
            &self.image_tag
        }
    }

    /// `image:tag` as the engine lists it locally
    pub fn image_reference(&self) -> String {
        format!("{}:{}", self.image, self.tag())
    }

    /// Fully qualified reference used for pulls
    pub fn canonical_reference(&self, registry: &str) -> String {
        let registry = registry.trim_end_matches('/');
        if registry.is_empty() {
            self.image_reference()
        } else {
            format!("{}/{}", registry, self.image_reference())
        }
    }

    pub fn is_generic(&self) -> bool {
        self.scope == ScannerScope::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gosec() -> SecurityTest {
        SecurityTest {
            name: "gosec".to_string(),
            image: "securego/gosec".to_string(),
            image_tag: String::new(),
            command: "gosec ./...".to_string(),
            scope: ScannerScope::Language,
            language: "Go".to_string(),
            default_enabled: true,
            timeout_secs: 360,
        }
    }

    #[test]
    fn test_tag_defaults_to_latest() {
        let test = gosec();
        assert_eq!(test.tag(), "latest");
        assert_eq!(test.image_reference(), "securego/gosec:latest");
    }

    #[test]
    fn test_canonical_reference_with_registry() {
        let mut test = gosec();
        test.image_tag = "v2.1".to_string();
        assert_eq!(
            test.canonical_reference("docker.io/"),
            "docker.io/securego/gosec:v2.1"
        );
        assert_eq!(test.canonical_reference(""), "securego/gosec:v2.1");
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "name": "gitleaks",
            "image": "zricethezav/gitleaks",
            "cmd": "gitleaks --repo=%GIT_REPO%",
            "type": "Generic",
            "default": true,
            "timeOutSeconds": 600
        }"#;
        let test: SecurityTest = serde_json::from_str(json).unwrap();
        assert!(test.is_generic());
        assert!(test.language.is_empty());
        assert_eq!(test.timeout_secs, 600);
    }
}
