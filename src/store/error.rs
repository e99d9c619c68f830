use thiserror::Error;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The filter matched nothing
    #[error("{0} not found")]
    NotFound(String),

    #[error("Analysis {0} already exists")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
