use thiserror::Error;

/// Errors raised by the container engine and the adapter around it
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Raw engine failure, message kept verbatim
    #[error("Container engine error: {0}")]
    Engine(String),

    #[error("Could not connect to container engine: {0}")]
    Connection(String),

    /// The container's command exited with a non-zero status
    #[error("Error in POST to wait the container with statusCode {code}")]
    NonZeroExit { code: i64 },

    /// Client-side deadline around the wait call expired
    #[error("Container did not finish within {secs}s")]
    WaitTimeout { secs: u64 },

    #[error("Image {image} was not available after {secs}s")]
    PullTimeout { image: String, secs: u64 },

    #[error("Container {cid} failed to start after {attempts} attempts: {last}")]
    StartFailed {
        cid: String,
        attempts: u32,
        last: String,
    },
}

impl RuntimeError {
    /// True for outcomes of the wait step the unit records as a failed scan
    pub fn is_wait_failure(&self) -> bool {
        matches!(
            self,
            RuntimeError::NonZeroExit { .. } | RuntimeError::WaitTimeout { .. }
        )
    }
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(err: bollard::errors::Error) -> Self {
        RuntimeError::Engine(err.to_string())
    }
}
