//! Configuration management for scanfleet
//!
//! Settings are read from environment variables with sensible defaults.
//! `ScanfleetConfig::default()` falls back silently on unparsable values, while
//! `ScanfleetConfig::from_env()` reports them as `ConfigError::ParseError`.
//!
//! # Environment Variables
//!
//! - `SCANFLEET_DOCKER_HOST`: container engine host - default: "localhost"
//! - `SCANFLEET_DOCKER_PORT`: container engine port - default: "2376"
//! - `SCANFLEET_DOCKER_CERT_PATH`: directory with `ca.pem`, `cert.pem`, `key.pem` - default: unset (local socket)
//! - `SCANFLEET_DOCKER_TLS_VERIFY`: verify the engine certificate - default: "true"
//! - `SCANFLEET_MAX_CONTAINERS`: safety valve threshold - default: "50"
//! - `SCANFLEET_PULL_INTERVAL`: seconds between image presence polls - default: "15"
//! - `SCANFLEET_PULL_TIMEOUT`: total seconds to wait for an image - default: "900"
//! - `SCANFLEET_START_RETRIES`: container start attempts - default: "5"
//! - `SCANFLEET_REGISTRY_URL`: registry prefix for scanner images - default: "docker.io"
//! - `SCANFLEET_GIT_PRIVATE_SSH_KEY`: key substituted into scanner commands - default: empty
//! - `SCANFLEET_SCANNERS_FILE`: YAML scanner definitions - default: "scanners.yaml"
//! - `SCANFLEET_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use scanfleet::ScanfleetConfig;
//!
//! let config = ScanfleetConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::runtime::PullPolicy;

const DEFAULT_DOCKER_HOST: &str = "localhost";
const DEFAULT_DOCKER_PORT: u16 = 2376;
const DEFAULT_TLS_VERIFY: bool = true;
const DEFAULT_MAX_CONTAINERS: usize = 50;
const DEFAULT_PULL_INTERVAL_SECS: u64 = 15;
const DEFAULT_PULL_TIMEOUT_SECS: u64 = 900;
const DEFAULT_START_RETRIES: u32 = 5;
const DEFAULT_REGISTRY_URL: &str = "docker.io";
const DEFAULT_SCANNERS_FILE: &str = "scanners.yaml";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Main configuration structure for scanfleet
#[derive(Debug, Clone)]
pub struct ScanfleetConfig {
    /// Container engine host, without scheme
    pub docker_host: String,

    pub docker_port: u16,

    /// Directory holding the engine's TLS client certificates
    pub docker_cert_path: Option<PathBuf>,

    pub docker_tls_verify: bool,

    /// Completed containers before the safety valve clears the engine
    pub max_containers: usize,

    pub pull_interval_secs: u64,

    pub pull_timeout_secs: u64,

    pub start_retries: u32,

    /// Registry prefix for scanner images
    pub registry_url: String,

    /// Secret substituted into `%GIT_PRIVATE_SSH_KEY%`
    pub git_private_ssh_key: String,

    pub scanners_file: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn lenient<T>(key: &str, fallback: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    parse_var(key).ok().flatten().unwrap_or(fallback)
}

impl Default for ScanfleetConfig {
    /// Loads from environment variables, falling back to defaults for anything
    /// missing or unparsable
    fn default() -> Self {
        Self {
            docker_host: var("SCANFLEET_DOCKER_HOST")
                .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string()),
            docker_port: lenient("SCANFLEET_DOCKER_PORT", DEFAULT_DOCKER_PORT),
            docker_cert_path: var("SCANFLEET_DOCKER_CERT_PATH").map(PathBuf::from),
            docker_tls_verify: lenient("SCANFLEET_DOCKER_TLS_VERIFY", DEFAULT_TLS_VERIFY),
            max_containers: lenient("SCANFLEET_MAX_CONTAINERS", DEFAULT_MAX_CONTAINERS),
            pull_interval_secs: lenient("SCANFLEET_PULL_INTERVAL", DEFAULT_PULL_INTERVAL_SECS),
            pull_timeout_secs: lenient("SCANFLEET_PULL_TIMEOUT", DEFAULT_PULL_TIMEOUT_SECS),
            start_retries: lenient("SCANFLEET_START_RETRIES", DEFAULT_START_RETRIES),
            registry_url: var("SCANFLEET_REGISTRY_URL")
                .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string()),
            git_private_ssh_key: env::var("SCANFLEET_GIT_PRIVATE_SSH_KEY").unwrap_or_default(),
            scanners_file: var("SCANFLEET_SCANNERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCANNERS_FILE)),
            log_level: var("SCANFLEET_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        }
    }
}

impl ScanfleetConfig {
    /// Loads from environment variables, rejecting numeric or boolean values
    /// that do not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            docker_port: parse_var("SCANFLEET_DOCKER_PORT")?.unwrap_or(DEFAULT_DOCKER_PORT),
            docker_tls_verify: parse_var("SCANFLEET_DOCKER_TLS_VERIFY")?
                .unwrap_or(DEFAULT_TLS_VERIFY),
            max_containers: parse_var("SCANFLEET_MAX_CONTAINERS")?
                .unwrap_or(DEFAULT_MAX_CONTAINERS),
            pull_interval_secs: parse_var("SCANFLEET_PULL_INTERVAL")?
                .unwrap_or(DEFAULT_PULL_INTERVAL_SECS),
            pull_timeout_secs: parse_var("SCANFLEET_PULL_TIMEOUT")?
                .unwrap_or(DEFAULT_PULL_TIMEOUT_SECS),
            start_retries: parse_var("SCANFLEET_START_RETRIES")?
                .unwrap_or(DEFAULT_START_RETRIES),
            ..defaults
        })
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` describing the first invalid value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.docker_host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Docker host must not be empty".to_string(),
            ));
        }
        if self.docker_port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Docker port must be between 1 and 65535".to_string(),
            ));
        }
        if self.max_containers == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max containers must be at least 1".to_string(),
            ));
        }
        if self.pull_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Pull interval must be at least 1 second".to_string(),
            ));
        }
        if self.pull_interval_secs > self.pull_timeout_secs {
            return Err(ConfigError::ValidationFailed(format!(
                "Pull interval ({}s) cannot exceed pull timeout ({}s)",
                self.pull_interval_secs, self.pull_timeout_secs
            )));
        }
        if self.start_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "Start retries must be at least 1".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// `host:port` of the container engine
    pub fn docker_address(&self) -> String {
        format!("{}:{}", self.docker_host, self.docker_port)
    }

    pub fn pull_policy(&self) -> PullPolicy {
        PullPolicy {
            interval: Duration::from_secs(self.pull_interval_secs),
            timeout: Duration::from_secs(self.pull_timeout_secs),
        }
    }

    /// Converts configuration to a display map for output formatting.
    /// The SSH key is never included, only whether one is set.
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        map.insert("docker_host".to_string(), self.docker_host.clone());
        map.insert("docker_port".to_string(), self.docker_port.to_string());
        if let Some(ref dir) = self.docker_cert_path {
            map.insert("docker_cert_path".to_string(), dir.display().to_string());
        }
        map.insert(
            "docker_tls_verify".to_string(),
            self.docker_tls_verify.to_string(),
        );
        map.insert("max_containers".to_string(), self.max_containers.to_string());
        map.insert(
            "pull_interval_secs".to_string(),
            self.pull_interval_secs.to_string(),
        );
        map.insert(
            "pull_timeout_secs".to_string(),
            self.pull_timeout_secs.to_string(),
        );
        map.insert("start_retries".to_string(), self.start_retries.to_string());
        map.insert("registry_url".to_string(), self.registry_url.clone());
        map.insert(
            "git_private_ssh_key".to_string(),
            if self.git_private_ssh_key.is_empty() {
                "unset".to_string()
            } else {
                "set".to_string()
            },
        );
        map.insert(
            "scanners_file".to_string(),
            self.scanners_file.display().to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for ScanfleetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scanfleet Configuration:")?;
        writeln!(f, "  Docker Engine: {}", self.docker_address())?;
        match self.docker_cert_path {
            Some(ref dir) => writeln!(
                f,
                "  TLS: {} (verify: {})",
                dir.display(),
                self.docker_tls_verify
            )?,
            None => writeln!(f, "  TLS: disabled")?,
        }
        writeln!(f, "  Max Containers: {}", self.max_containers)?;
        writeln!(
            f,
            "  Image Pull: every {}s, up to {}s",
            self.pull_interval_secs, self.pull_timeout_secs
        )?;
        writeln!(f, "  Start Retries: {}", self.start_retries)?;
        writeln!(f, "  Registry: {}", self.registry_url)?;
        writeln!(
            f,
            "  SSH Key: {}",
            if self.git_private_ssh_key.is_empty() {
                "unset"
            } else {
                "set"
            }
        )?;
        writeln!(f, "  Scanners File: {}", self.scanners_file.display())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
