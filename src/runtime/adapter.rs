//! Lifecycle policy around a raw container engine

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{ContainerRuntime, RuntimeError, SafetyValve};

const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(15);
const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(900);
const DEFAULT_START_ATTEMPTS: u32 = 5;

/// How long to keep polling for an image after asking the engine to pull it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PullPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PULL_INTERVAL,
            timeout: DEFAULT_PULL_TIMEOUT,
        }
    }
}

/// Engine handle shared by every scan unit of the process
#[derive(Clone)]
pub struct RuntimeAdapter {
    engine: Arc<dyn ContainerRuntime>,
    valve: Arc<SafetyValve>,
    pull_policy: PullPolicy,
    start_attempts: u32,
}

impl RuntimeAdapter {
    pub fn new(engine: Arc<dyn ContainerRuntime>, max_containers: usize) -> Self {
        Self {
            engine,
            valve: Arc::new(SafetyValve::new(max_containers)),
            pull_policy: PullPolicy::default(),
            start_attempts: DEFAULT_START_ATTEMPTS,
        }
    }

    pub fn with_pull_policy(mut self, pull_policy: PullPolicy) -> Self {
        self.pull_policy = pull_policy;
        self
    }

    pub fn with_start_attempts(mut self, attempts: u32) -> Self {
        self.start_attempts = attempts.max(1);
        self
    }

    pub fn engine(&self) -> &Arc<dyn ContainerRuntime> {
        &self.engine
    }

    pub fn valve(&self) -> &SafetyValve {
        &self.valve
    }

    pub async fn ping(&self) -> Result<(), RuntimeError> {
        self.engine.ping().await
    }

    /// Pulls `image` and polls until the engine lists it.
    ///
    /// The pull is reissued on every poll interval. Gives up with `PullTimeout`
    /// once the policy's total timeout has elapsed.
    pub async fn pull_with_retry(&self, image: &str) -> Result<(), RuntimeError> {
        if self.engine.image_is_loaded(image).await? {
            debug!(image, "Image already present");
            return Ok(());
        }

        let deadline = Instant::now() + self.pull_policy.timeout;
        loop {
            info!(image, "Pulling image");
            self.engine.pull_image(image).await?;
            if self.engine.image_is_loaded(image).await? {
                info!(image, "Image pulled");
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(RuntimeError::PullTimeout {
                    image: image.to_string(),
                    secs: self.pull_policy.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.pull_policy.interval.min(deadline - now)).await;
        }
    }

    pub async fn create_container(&self, image: &str, cmd: &str) -> Result<String, RuntimeError> {
        self.engine.create_container(image, cmd).await
    }

    /// Starts the container, retrying immediately up to the configured attempts
    pub async fn start_with_retry(&self, cid: &str) -> Result<(), RuntimeError> {
        let mut last = String::new();
        for attempt in 1..=self.start_attempts {
            match self.engine.start_container(cid).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(cid, attempt, error = %e, "Container start failed");
                    last = e.to_string();
                }
            }
        }
        Err(RuntimeError::StartFailed {
            cid: cid.to_string(),
            attempts: self.start_attempts,
            last,
        })
    }

    /// Waits for the container under a client-side deadline. Zero means no deadline.
    pub async fn wait_with_deadline(&self, cid: &str, timeout_secs: u64) -> Result<(), RuntimeError> {
        if timeout_secs == 0 {
            return self.engine.wait_container(cid).await;
        }
        match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.engine.wait_container(cid),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::WaitTimeout { secs: timeout_secs }),
        }
    }

    pub async fn read_output(&self, cid: &str) -> Result<String, RuntimeError> {
        self.engine.read_output(cid).await
    }

    /// Removes the container; failures are logged and swallowed
    pub async fn cleanup(&self, cid: &str) {
        if let Err(e) = self.engine.remove_container(cid).await {
            warn!(cid, error = %e, "Failed to remove container");
        }
    }

    /// Stops and removes every running container on the engine.
    /// Returns how many containers were listed.
    pub async fn die_all(&self) -> usize {
        let running = match self.engine.list_running().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list running containers");
                return 0;
            }
        };

        for cid in &running {
            if let Err(e) = self.engine.stop_container(cid).await {
                warn!(cid = %cid, error = %e, "Failed to stop container");
            }
            if let Err(e) = self.engine.remove_container(cid).await {
                warn!(cid = %cid, error = %e, "Failed to remove container");
            }
        }
        running.len()
    }

    /// Counts one finished unit and fires the safety valve when the threshold is hit
    pub async fn record_completion(&self) {
        if self.valve.record() {
            warn!(
                max = self.valve.max(),
                "Container threshold reached, removing all running containers"
            );
            let removed = self.die_all().await;
            info!(removed, "Safety valve cleared running containers");
        }
    }
}
