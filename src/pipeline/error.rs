use thiserror::Error;

use crate::analyzers::AnalyzerError;
use crate::runtime::RuntimeError;
use crate::store::StoreError;

/// Failure of one scan unit that leaves no usable result for its scanner
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scanner '{0}' has no runnable command")]
    EmptyCommand(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Hard errors that end an analysis as `error running`
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Scanner '{scanner}' failed: {source}")]
    Unit {
        scanner: String,
        #[source]
        source: ScanError,
    },

    #[error("No '{0}' scanner is registered")]
    MissingScanner(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rejections at request intake
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid repository branch: {0}")]
    InvalidBranch(String),

    #[error("An analysis is already running for this repository and branch (RID {rid})")]
    AlreadyRunning { rid: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
