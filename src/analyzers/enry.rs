//! Language detection analyzer
//!
//! enry prints a map of language name to the files written in it. The result feeds
//! scanner selection rather than the vulnerability report.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, Artifacts, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Code, ScanResult, SecurityTestOutput};

pub struct EnryAnalyzer;

impl EnryAnalyzer {
    fn codes(map: BTreeMap<String, Vec<Value>>) -> Result<Vec<Code>, AnalyzerError> {
        map.into_iter()
            .map(|(language, files)| {
                let files = files
                    .into_iter()
                    .map(|f| match f {
                        Value::String(s) => Ok(s),
                        _ => Err(AnalyzerError::InvalidLanguageMap),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Code { language, files })
            })
            .collect()
    }
}

impl OutputAnalyzer for EnryAnalyzer {
    fn scanner(&self) -> &'static str {
        "enry"
    }

    fn tool(&self) -> &'static str {
        "Enry"
    }

    fn language(&self) -> &'static str {
        "Generic"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Err(AnalyzerError::EmptyOutput);
        }

        let map: BTreeMap<String, Vec<Value>> = from_json(self.tool(), raw)?;
        let codes = Self::codes(map)?;
        let info = if codes.is_empty() {
            "No languages detected."
        } else {
            "Languages detected."
        };

        Ok(
            ScanOutcome::new(ScanResult::Passed, info, SecurityTestOutput::default())
                .with_artifacts(Artifacts::Codes(codes)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_map() {
        let raw = r#"{"Go":["main.go","util/util.go"],"Python":["scripts/build.py"]}"#;
        let outcome = EnryAnalyzer.analyze(raw).unwrap();

        assert_eq!(outcome.result, ScanResult::Passed);
        let Artifacts::Codes(codes) = outcome.artifacts else {
            panic!("expected language codes");
        };
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].language, "Go");
        assert_eq!(codes[0].files, vec!["main.go", "util/util.go"]);
        assert_eq!(codes[1].language, "Python");
    }

    #[test]
    fn test_empty_output_is_error() {
        assert!(matches!(
            EnryAnalyzer.analyze("  \n"),
            Err(AnalyzerError::EmptyOutput)
        ));
    }

    #[test]
    fn test_non_string_file_is_error() {
        let err = EnryAnalyzer.analyze(r#"{"Go":["main.go",3]}"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidLanguageMap));
        assert_eq!(err.info(), "error mapping languages");
    }

    #[test]
    fn test_empty_map_detects_nothing() {
        let outcome = EnryAnalyzer.analyze("{}").unwrap();
        assert_eq!(outcome.artifacts, Artifacts::Codes(vec![]));
    }

    #[test]
    fn test_cloning_error() {
        assert!(matches!(
            EnryAnalyzer.analyze("ERROR_CLONING"),
            Err(AnalyzerError::Cloning)
        ));
    }
}
