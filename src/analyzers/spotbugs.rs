//! SpotBugs analyzer
//!
//! Reads the XML report (`BugCollection/BugInstance`). Bug rank drives the bucket:
//! 1-9 are the "scariest" and "scary" ranks, 10-14 "troubling", the rest "of concern".

use roxmltree::{Document, Node};

use super::error::AnalyzerError;
use super::outcome::{check_preconditions, line_span, malformed, ScanOutcome};
use super::trait_def::OutputAnalyzer;
use crate::model::{Bucket, ScanResult, SecurityTestOutput, Vulnerability};

const LOWEST_RANK: u32 = 20;

fn bucket_for(rank: u32) -> (Bucket, &'static str) {
    if rank < 10 {
        (Bucket::High, "HIGH")
    } else if rank < 15 {
        (Bucket::Medium, "MEDIUM")
    } else {
        (Bucket::Low, "LOW")
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
}

pub struct SpotBugsAnalyzer;

impl SpotBugsAnalyzer {
    fn vulnerability(&self, bug: Node<'_, '_>) -> (Bucket, Vulnerability) {
        let attr = |name: &str| bug.attribute(name).unwrap_or_default().to_string();
        let rank = bug
            .attribute("rank")
            .and_then(|r| r.trim().parse::<u32>().ok())
            .unwrap_or(LOWEST_RANK);
        let (bucket, severity) = bucket_for(rank);

        let kind = attr("type");
        let mut vuln = Vulnerability {
            severity: severity.to_string(),
            confidence: attr("priority"),
            title: child_text(bug, "ShortMessage").unwrap_or_else(|| kind.clone()),
            details: child_text(bug, "LongMessage")
                .unwrap_or_else(|| format!("{} ({})", attr("category"), attr("abbrev"))),
            kind,
            ..Vulnerability::new(self.language(), self.tool())
        };

        if let Some(source) = child(bug, "SourceLine") {
            let start = source.attribute("start").unwrap_or_default();
            let end = source.attribute("end").unwrap_or(start);
            vuln.file = source
                .attribute("sourcepath")
                .or_else(|| source.attribute("classname"))
                .unwrap_or_default()
                .to_string();
            vuln.line = start.to_string();
            if !start.is_empty() {
                vuln.code = line_span(start, end);
            }
        }

        (bucket, vuln)
    }
}

impl OutputAnalyzer for SpotBugsAnalyzer {
    fn scanner(&self) -> &'static str {
        "spotbugs"
    }

    fn tool(&self) -> &'static str {
        "SpotBugs"
    }

    fn language(&self) -> &'static str {
        "Java"
    }

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError> {
        if check_preconditions(raw)? {
            return Ok(ScanOutcome::clean());
        }

        let doc = Document::parse(raw.trim()).map_err(|e| malformed(self.tool(), raw, e))?;
        let root = doc.root_element();
        if root.tag_name().name() != "BugCollection" {
            return Err(malformed(
                self.tool(),
                raw,
                format!("unexpected root element <{}>", root.tag_name().name()),
            ));
        }

        let mut vulnerabilities = SecurityTestOutput::default();
        for bug in root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "BugInstance")
        {
            let (bucket, vuln) = self.vulnerability(bug);
            vulnerabilities.push(bucket, vuln);
        }

        Ok(ScanOutcome::graded(vulnerabilities, ScanResult::Warning))
    }
}
