use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized finding every analyzer maps into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vulnerability {
    pub language: String,
    #[serde(rename = "securitytool")]
    pub security_tool: String,
    pub severity: String,
    pub confidence: String,
    pub file: String,
    /// Kept as text since some tools report ranges
    pub line: String,
    pub code: String,
    pub details: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(rename = "vulnerablebelow")]
    pub vulnerable_below: String,
    pub version: String,
    pub occurrences: u32,
}

impl Vulnerability {
    pub fn new(language: &str, security_tool: &str) -> Self {
        Self {
            language: language.to_string(),
            security_tool: security_tool.to_string(),
            ..Default::default()
        }
    }
}

/// Severity bucket a finding lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    NoSec,
    Low,
    Medium,
    High,
}

/// One tool's findings grouped by bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityTestOutput {
    #[serde(rename = "nosecvulns")]
    pub nosec: Vec<Vulnerability>,
    #[serde(rename = "lowvulns")]
    pub low: Vec<Vulnerability>,
    #[serde(rename = "mediumvulns")]
    pub medium: Vec<Vulnerability>,
    #[serde(rename = "highvulns")]
    pub high: Vec<Vulnerability>,
}

impl SecurityTestOutput {
    pub fn push(&mut self, bucket: Bucket, vulnerability: Vulnerability) {
        self.bucket_mut(bucket).push(vulnerability);
    }

    pub fn bucket(&self, bucket: Bucket) -> &[Vulnerability] {
        match bucket {
            Bucket::NoSec => &self.nosec,
            Bucket::Low => &self.low,
            Bucket::Medium => &self.medium,
            Bucket::High => &self.high,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Vulnerability> {
        match bucket {
            Bucket::NoSec => &mut self.nosec,
            Bucket::Low => &mut self.low,
            Bucket::Medium => &mut self.medium,
            Bucket::High => &mut self.high,
        }
    }

    /// Adds the finding unless one with the same details and code is already in
    /// the bucket, in which case that entry's occurrence count is bumped.
    pub fn push_deduplicated(&mut self, bucket: Bucket, vulnerability: Vulnerability) {
        let entries = self.bucket_mut(bucket);
        match entries
            .iter_mut()
            .find(|v| v.details == vulnerability.details && v.code == vulnerability.code)
        {
            Some(existing) => existing.occurrences += 1,
            None => entries.push(vulnerability),
        }
    }

    pub fn extend(&mut self, other: SecurityTestOutput) {
        self.nosec.extend(other.nosec);
        self.low.extend(other.low);
        self.medium.extend(other.medium);
        self.high.extend(other.high);
    }

    pub fn has_medium_or_high(&self) -> bool {
        !self.medium.is_empty() || !self.high.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nosec.len() + self.low.len() + self.medium.len() + self.high.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consolidated results of an analysis: language group → tool → buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsolidatedResults(BTreeMap<String, BTreeMap<String, SecurityTestOutput>>);

impl ConsolidatedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one tool's findings under its language group
    pub fn merge(&mut self, language: &str, tool: &str, output: SecurityTestOutput) {
        self.0
            .entry(language.to_string())
            .or_default()
            .entry(tool.to_string())
            .or_default()
            .extend(output);
    }

    pub fn get(&self, language: &str, tool: &str) -> Option<&SecurityTestOutput> {
        self.0.get(language).and_then(|tools| tools.get(tool))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &SecurityTestOutput)> {
        self.0.iter().flat_map(|(language, tools)| {
            tools
                .iter()
                .map(move |(tool, output)| (language.as_str(), tool.as_str(), output))
        })
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, _, output)| output.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
