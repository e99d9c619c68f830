//! Commit authors analyzer

use serde::Deserialize;

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, from_json, Artifacts, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{ScanResult, SecurityTestOutput};
use crate::util::text::dedup_preserving_order;

#[derive(Debug, Deserialize)]
struct GitAuthorsOutput {
    #[serde(default)]
    authors: Option<Vec<String>>,
}

pub struct GitAuthorsAnalyzer;

impl OutputAnalyzer for GitAuthorsAnalyzer {
    fn scanner(&self) -> &'static str {
        "gitauthors"
    }

    fn tool(&self) -> &'static str {
        "GitAuthors"
    }

    fn language(&self) -> &'static str {
        "Generic"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        let authors = if check_preconditions(raw)? {
            Vec::new()
        } else {
            let output: GitAuthorsOutput = from_json(self.tool(), raw)?;
            dedup_preserving_order(output.authors.unwrap_or_default())
        };

        let info = if authors.is_empty() {
            "No commit authors found."
        } else {
            "Commit authors found."
        };
        Ok(
            ScanOutcome::new(ScanResult::Passed, info, SecurityTestOutput::default())
                .with_artifacts(Artifacts::CommitAuthors(authors)),
        )
    }
}
