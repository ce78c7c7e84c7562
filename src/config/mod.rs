//! Configuration structures and validation
//!
//! The [`Config`] struct is the single source of truth for a run. It is
//! normally built from CLI arguments, but every section derives
//! `Deserialize` with per-field defaults so partial configurations
//! (tests, embedding callers) fill in sensibly.

pub mod cli;

pub use cli::Cli;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for a word-count run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input files, one per worker
    pub inputs: Vec<PathBuf>,

    /// Worker fleet settings
    #[serde(default)]
    pub workers: WorkerConfig,

    /// Container provisioning settings
    #[serde(default)]
    pub provision: ProvisionConfig,

    /// Work dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Runtime behavior settings
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Worker fleet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker containers to provision
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

/// Container provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Docker image that serves the word-count endpoint
    #[serde(default = "default_image")]
    pub image: String,

    /// Container-internal port the worker listens on
    #[serde(default = "default_container_port")]
    pub container_port: u16,

    /// First host port to try when publishing worker endpoints
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// How many host ports past base_port may be probed before giving up
    #[serde(default = "default_port_span")]
    pub port_span: u16,

    /// Host the orchestrator reaches workers on
    #[serde(default = "default_host")]
    pub host: String,

    /// Milliseconds to wait for a started worker to accept connections
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Milliseconds between readiness probe attempts
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Work dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-request timeout for worker calls, in milliseconds
    #[serde(default = "default_dispatch_timeout_ms")]
    pub timeout_ms: u64,
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// JSON report file path
    #[serde(default)]
    pub json_output: Option<PathBuf>,
}

/// Runtime behavior settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Abort on the first worker failure instead of skipping that input
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_worker_count() -> usize {
    1
}

fn default_image() -> String {
    "tushar12345678/wordcount:latest".to_string()
}

fn default_container_port() -> u16 {
    3000
}

fn default_base_port() -> u16 {
    8000
}

fn default_port_span() -> u16 {
    100
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ready_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_dispatch_timeout_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            container_port: default_container_port(),
            base_port: default_base_port(),
            port_span: default_port_span(),
            host: default_host(),
            ready_timeout_ms: default_ready_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_dispatch_timeout_ms(),
        }
    }
}

impl ProvisionConfig {
    /// Readiness deadline as a [`Duration`]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Probe interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl DispatchConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Build a configuration from parsed CLI arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            inputs: cli.files.clone(),
            workers: WorkerConfig { count: cli.workers },
            provision: ProvisionConfig {
                image: cli.image.clone(),
                container_port: cli.container_port,
                base_port: cli.base_port,
                ready_timeout_ms: cli.ready_timeout * 1000,
                ..Default::default()
            },
            dispatch: DispatchConfig {
                timeout_ms: cli.dispatch_timeout * 1000,
            },
            output: OutputConfig {
                json_output: cli.json_output.clone(),
            },
            runtime: RuntimeConfig {
                debug: cli.debug,
                fail_fast: cli.fail_fast,
            },
        }
    }

    /// Validate the configuration
    ///
    /// Checks every invariant that must hold before any container is
    /// touched. In particular the worker count must match the number of
    /// input files exactly, so a misconfigured run fails before it
    /// provisions anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.count == 0 {
            return Err(ConfigError::NoWorkers);
        }

        if self.workers.count != self.inputs.len() {
            return Err(ConfigError::ArityMismatch {
                workers: self.workers.count,
                files: self.inputs.len(),
            });
        }

        if (self.provision.port_span as usize) < self.workers.count {
            return Err(ConfigError::PortSpanTooSmall {
                span: self.provision.port_span,
                workers: self.workers.count,
            });
        }

        if self.provision.container_port == 0 {
            return Err(ConfigError::Invalid(
                "container_port must be non-zero".to_string(),
            ));
        }

        if self.provision.base_port == 0 {
            return Err(ConfigError::Invalid(
                "base_port must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
