//! Output analyzer trait definition

use super::error::AnalyzerError;
use super::outcome::ScanOutcome;

/// Turns one scanner's raw container output into normalized findings and a verdict.
///
/// Implementations are pure: no I/O, no shared state. The `scanner` name is the
/// registry key and must match the `name` of the SecurityTest it interprets.
pub trait OutputAnalyzer: Send + Sync {
    /// Scanner definition name this analyzer handles
    fn scanner(&self) -> &'static str;

    /// Tool name stamped on findings and used as the consolidated results key
    fn tool(&self) -> &'static str;

    /// Language group the findings are consolidated under
    fn language(&self) -> &'static str;

    fn analyze(&self, raw: &str) -> Result<ScanOutcome, AnalyzerError>;
}
