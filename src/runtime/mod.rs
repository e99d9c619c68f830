//! Container runtime
//!
//! [`ContainerRuntime`] is the raw engine seam: one method per engine call, no
//! retries or policy. [`RuntimeAdapter`] layers the scan lifecycle policy on top
//! (idempotent pulls with polling, bounded start retries, client-side wait
//! deadline, best-effort cleanup and the running-container safety valve).

use async_trait::async_trait;

pub mod adapter;
pub mod docker;
pub mod error;
pub mod valve;

pub use adapter::{PullPolicy, RuntimeAdapter};
pub use docker::DockerRuntime;
pub use error::RuntimeError;
pub use valve::SafetyValve;

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Checks that the engine answers
    async fn ping(&self) -> Result<(), RuntimeError>;

    async fn image_is_loaded(&self, image: &str) -> Result<bool, RuntimeError>;

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError>;

    /// Creates a container running `cmd` through `/bin/sh -c`, returning its ID
    async fn create_container(&self, image: &str, cmd: &str) -> Result<String, RuntimeError>;

    async fn start_container(&self, cid: &str) -> Result<(), RuntimeError>;

    /// Blocks until the container exits; a non-zero status is `NonZeroExit`
    async fn wait_container(&self, cid: &str) -> Result<(), RuntimeError>;

    /// Captured stdout of a finished container
    async fn read_output(&self, cid: &str) -> Result<String, RuntimeError>;

    async fn stop_container(&self, cid: &str) -> Result<(), RuntimeError>;

    /// Force-removes the container
    async fn remove_container(&self, cid: &str) -> Result<(), RuntimeError>;

    /// IDs of every running container on the engine
    async fn list_running(&self) -> Result<Vec<String>, RuntimeError>;
}
