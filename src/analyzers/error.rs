use thiserror::Error;

/// Failures while interpreting a scanner's raw output
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The container could not check out the repository before the tool ran
    #[error("Error clonning repository")]
    Cloning,

    /// The tool itself signalled that it could not run
    #[error("{tool} reported an internal error: {detail}")]
    ToolFailure { tool: &'static str, detail: String },

    /// Output did not match the tool's native format
    #[error("Failed to parse {tool} output: {reason}")]
    Malformed {
        tool: &'static str,
        reason: String,
        raw: String,
    },

    /// The language detector produced nothing
    #[error("empty enry results")]
    EmptyOutput,

    /// The language detector listed a non-string file entry
    #[error("error mapping languages")]
    InvalidLanguageMap,

    #[error("No analyzer registered for scanner '{0}'")]
    UnknownScanner(String),
}

impl AnalyzerError {
    /// Text recorded as the container's CInfo
    pub fn info(&self) -> String {
        match self {
            AnalyzerError::Cloning => "Error clonning repository".to_string(),
            AnalyzerError::ToolFailure { tool, .. } => format!("Internal error running {}.", tool),
            AnalyzerError::Malformed { tool, .. } => format!("Error parsing {} output.", tool),
            other => other.to_string(),
        }
    }

    /// True when the failure belongs to the tool run alone. Such failures are
    /// recorded on the container and do not abort the batch.
    pub fn is_scanner_local(&self) -> bool {
        matches!(self, AnalyzerError::ToolFailure { .. })
    }

    /// Raw payload kept for diagnostics, when there is one
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AnalyzerError::Malformed { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_messages() {
        assert_eq!(AnalyzerError::Cloning.info(), "Error clonning repository");
        let failure = AnalyzerError::ToolFailure {
            tool: "Safety",
            detail: "ERROR_RUNNING_SAFETY".to_string(),
        };
        assert_eq!(failure.info(), "Internal error running Safety.");
        assert_eq!(AnalyzerError::EmptyOutput.info(), "empty enry results");
    }

    #[test]
    fn test_malformed_keeps_raw_payload() {
        let err = AnalyzerError::Malformed {
            tool: "GoSec",
            reason: "expected value".to_string(),
            raw: "{not json".to_string(),
        };
        assert_eq!(err.raw_output(), Some("{not json"));
        assert_eq!(err.info(), "Error parsing GoSec output.");
        assert!(AnalyzerError::Cloning.raw_output().is_none());
    }
}
