//! Docker engine client backed by bollard

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use super::{ContainerRuntime, RuntimeError};
use crate::config::ScanfleetConfig;

/// Seconds bollard waits on each engine request
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Registry prefix the engine strips from local image names
const DEFAULT_REGISTRY_PREFIX: &str = "docker.io/";

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects using the engine settings from configuration.
    ///
    /// With a certificate directory the client speaks TLS to `host:port` using
    /// `ca.pem`, `cert.pem` and `key.pem`. bollard always verifies the server
    /// certificate, so disabling verification falls back to plain HTTP. Without
    /// a certificate directory the local defaults (`DOCKER_HOST` or the unix
    /// socket) are used.
    pub fn connect(config: &ScanfleetConfig) -> Result<Self, RuntimeError> {
        let address = format!("tcp://{}", config.docker_address());
        let docker = match &config.docker_cert_path {
            Some(dir) if config.docker_tls_verify => {
                info!(address = %address, "Connecting to container engine over TLS");
                Self::connect_tls(&address, dir)?
            }
            Some(_) => {
                warn!(
                    address = %address,
                    "TLS verification disabled, connecting to container engine over plain HTTP"
                );
                Docker::connect_with_http(&address, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
                    .map_err(|e| RuntimeError::Connection(e.to_string()))?
            }
            None => {
                debug!("Connecting to local container engine");
                Docker::connect_with_local_defaults()
                    .map_err(|e| RuntimeError::Connection(e.to_string()))?
            }
        };
        Ok(Self { docker })
    }

    fn connect_tls(address: &str, cert_dir: &Path) -> Result<Docker, RuntimeError> {
        Docker::connect_with_ssl(
            address,
            &cert_dir.join("key.pem"),
            &cert_dir.join("cert.pem"),
            &cert_dir.join("ca.pem"),
            REQUEST_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            RuntimeError::Connection(format!(
                "TLS setup with certificates in {} failed: {}",
                cert_dir.display(),
                e
            ))
        })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    async fn has_image_reference(&self, reference: &str) -> Result<bool, RuntimeError> {
        let mut filters = HashMap::new();
        filters.insert("reference".to_string(), vec![reference.to_string()]);
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                filters,
                ..Default::default()
            }))
            .await?;
        Ok(!images.is_empty())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn image_is_loaded(&self, image: &str) -> Result<bool, RuntimeError> {
        if self.has_image_reference(image).await? {
            return Ok(true);
        }
        match image.strip_prefix(DEFAULT_REGISTRY_PREFIX) {
            Some(local) => self.has_image_reference(local).await,
            None => Ok(false),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut progress = self.docker.create_image(Some(options), None, None);
        while let Some(step) = progress.next().await {
            let step = step?;
            if let Some(status) = step.status {
                debug!(image, status = %status, "Pull progress");
            }
        }
        Ok(())
    }

    async fn create_container(&self, image: &str, cmd: &str) -> Result<String, RuntimeError> {
        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                cmd.to_string(),
            ]),
            tty: Some(true),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await?;
        for warning in &response.warnings {
            warn!(cid = %response.id, "Engine warning on create: {}", warning);
        }
        Ok(response.id)
    }

    async fn start_container(&self, cid: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(cid, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn wait_container(&self, cid: &str) -> Result<(), RuntimeError> {
        let mut stream = self
            .docker
            .wait_container(cid, None::<WaitContainerOptions<String>>);
        while let Some(result) = stream.next().await {
            match result {
                Ok(response) if response.status_code != 0 => {
                    return Err(RuntimeError::NonZeroExit {
                        code: response.status_code,
                    })
                }
                Ok(_) => {}
                Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => {
                    return Err(RuntimeError::NonZeroExit { code })
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn read_output(&self, cid: &str) -> Result<String, RuntimeError> {
        let options = LogsOptions::<String> {
            stdout: true,
            ..Default::default()
        };
        let mut logs = self.docker.logs(cid, Some(options));
        let mut output = String::new();
        while let Some(chunk) = logs.next().await {
            output.push_str(&chunk?.to_string());
        }
        Ok(output)
    }

    async fn stop_container(&self, cid: &str) -> Result<(), RuntimeError> {
        self.docker
            .stop_container(cid, None::<StopContainerOptions>)
            .await?;
        Ok(())
    }

    async fn remove_container(&self, cid: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(
                cid,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    async fn list_running(&self) -> Result<Vec<String>, RuntimeError> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }
}
