//! Subcommand handlers
//!
//! Each handler returns the process exit code. Errors are logged here and never
//! cross into `main`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::commands::{ConfigArgs, HealthArgs, ParseArgs, ScanArgs, ScannersArgs};
use super::output::{HealthStatus, OutputFormatter};
use crate::analyzers::AnalyzerRegistry;
use crate::config::ScanfleetConfig;
use crate::model::{Analysis, ScanResult};
use crate::pipeline::{AnalysisService, FanOutCoordinator, ScanUnit};
use crate::runtime::{DockerRuntime, RuntimeAdapter};
use crate::scanners::ScannerRegistry;
use crate::store::{AnalysisStore, MemoryStore};

pub const EXIT_PASSED: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_WARNING: i32 = 2;
pub const EXIT_ERROR: i32 = 3;

/// Maps an analysis result to the process exit code
pub fn exit_code_for(result: Option<ScanResult>) -> i32 {
    match result {
        Some(ScanResult::Passed) => EXIT_PASSED,
        Some(ScanResult::Failed) => EXIT_FAILED,
        Some(ScanResult::Warning) => EXIT_WARNING,
        Some(ScanResult::Error) | None => EXIT_ERROR,
    }
}

pub async fn handle_scan(args: &ScanArgs) -> i32 {
    info!(url = %args.url, branch = %args.branch, "Starting scan");

    let analysis = match run_scan(args).await {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("Scan failed: {:#}", e);
            return EXIT_ERROR;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    let rendered = match formatter.format_analysis(&analysis) {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Failed to format analysis: {:#}", e);
            return EXIT_ERROR;
        }
    };
    if let Err(e) = emit(&rendered, args.output.as_deref()) {
        error!("{:#}", e);
        return EXIT_ERROR;
    }

    exit_code_for(analysis.result)
}

async fn run_scan(args: &ScanArgs) -> Result<Analysis> {
    let config = load_config()?;
    let registry = load_registry(args.scanners.as_ref(), &config)?;

    let engine = DockerRuntime::connect(&config).context("Failed to connect to container engine")?;
    let runtime = RuntimeAdapter::new(Arc::new(engine), config.max_containers)
        .with_pull_policy(config.pull_policy())
        .with_start_attempts(config.start_retries);

    let store: Arc<dyn AnalysisStore> = Arc::new(MemoryStore::new(registry));
    let unit = ScanUnit::new(runtime, Arc::new(AnalyzerRegistry::with_defaults()), store)
        .with_registry_url(config.registry_url.clone())
        .with_ssh_key(config.git_private_ssh_key.clone());
    let service = AnalysisService::new(FanOutCoordinator::new(unit));

    let submission = service
        .submit(&args.url, &args.branch)
        .await
        .context("Scan request rejected")?;
    info!(rid = %submission.rid, "Analysis submitted");

    let analysis = submission
        .handle
        .await
        .context("Analysis task did not complete")?
        .context("Failed to finalize analysis")?;
    Ok(analysis)
}

pub fn handle_parse(args: &ParseArgs) -> i32 {
    let raw = match fs::read_to_string(&args.file) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to read {}: {}", args.file.display(), e);
            return EXIT_ERROR;
        }
    };

    let registry = AnalyzerRegistry::with_defaults();
    let outcome = match registry.analyze(&args.scanner, &raw) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(scanner = %args.scanner, "{}", e);
            println!("{}: {}", args.scanner, e.info());
            return EXIT_ERROR;
        }
    };

    match OutputFormatter::new(args.format.into()).format_outcome(&args.scanner, &outcome) {
        Ok(rendered) => {
            println!("{}", rendered);
            exit_code_for(Some(outcome.result))
        }
        Err(e) => {
            error!("Failed to format outcome: {:#}", e);
            EXIT_ERROR
        }
    }
}

pub fn handle_scanners(args: &ScannersArgs) -> i32 {
    let result = load_config().and_then(|config| load_registry(args.scanners.as_ref(), &config));
    let registry = match result {
        Ok(registry) => registry,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_ERROR;
        }
    };

    match OutputFormatter::new(args.format.into()).format_scanners(registry.all()) {
        Ok(rendered) => {
            println!("{}", rendered);
            EXIT_PASSED
        }
        Err(e) => {
            error!("Failed to format scanners: {:#}", e);
            EXIT_ERROR
        }
    }
}

pub async fn handle_health(args: &HealthArgs) -> i32 {
    info!("Checking container engine health");
    let config = ScanfleetConfig::default();
    let address = config.docker_address();

    let status = match DockerRuntime::connect(&config) {
        Ok(engine) => {
            let adapter = RuntimeAdapter::new(Arc::new(engine), config.max_containers);
            match adapter.ping().await {
                Ok(()) => {
                    info!("Container engine is available at {}", address);
                    HealthStatus::available(format!("Connected to {}", address))
                }
                Err(e) => {
                    warn!("Container engine ping failed: {}", e);
                    HealthStatus::unavailable(format!("Cannot reach {}", address))
                        .with_details(e.to_string())
                }
            }
        }
        Err(e) => {
            warn!("Cannot connect to container engine: {}", e);
            HealthStatus::unavailable(format!("Cannot connect to {}", address))
                .with_details(e.to_string())
        }
    };

    match OutputFormatter::new(args.format.into()).format_health(&status) {
        Ok(rendered) => {
            println!("{}", rendered);
            if status.available {
                EXIT_PASSED
            } else {
                EXIT_FAILED
            }
        }
        Err(e) => {
            error!("Failed to format health status: {:#}", e);
            EXIT_ERROR
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = ScanfleetConfig::default();
    if let Err(e) = config.validate() {
        warn!("{}", e);
    }

    match OutputFormatter::new(args.format.into()).format_config(&config) {
        Ok(rendered) => {
            println!("{}", rendered);
            EXIT_PASSED
        }
        Err(e) => {
            error!("Failed to format configuration: {:#}", e);
            EXIT_ERROR
        }
    }
}

fn load_config() -> Result<ScanfleetConfig> {
    let config = ScanfleetConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_registry(path: Option<&PathBuf>, config: &ScanfleetConfig) -> Result<ScannerRegistry> {
    let path = path.unwrap_or(&config.scanners_file);
    debug!("Loading scanner definitions from {}", path.display());
    ScannerRegistry::from_file(path)
        .with_context(|| format!("Failed to load scanner definitions from {}", path.display()))
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
