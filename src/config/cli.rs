//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

/// WordFleet - Distributed word-count orchestrator
#[derive(Parser, Debug)]
#[command(name = "wordfleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of worker containers to provision (must equal the number of input files)
    #[arg(short = 'n', long, default_value = "1")]
    pub workers: usize,

    /// Input files, one per worker
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    // === Provisioning Options ===
    /// Docker image that serves the word-count endpoint
    #[arg(long, default_value = "tushar12345678/wordcount:latest")]
    pub image: String,

    /// First host port to try when publishing worker endpoints
    #[arg(long, default_value = "8000")]
    pub base_port: u16,

    /// Container-internal port the worker listens on
    #[arg(long, default_value = "3000")]
    pub container_port: u16,

    /// Seconds to wait for a started worker to accept connections
    #[arg(long, default_value = "10")]
    pub ready_timeout: u64,

    // === Dispatch Options ===
    /// Per-request timeout for worker calls, in seconds
    #[arg(long, default_value = "30")]
    pub dispatch_timeout: u64,

    // === Error Handling Options ===
    /// Abort on the first worker failure instead of skipping that input
    #[arg(long)]
    pub fail_fast: bool,

    // === Output Options ===
    /// JSON report file path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Dry run - validate configuration without provisioning anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug output (timing, per-step diagnostics)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }

        if self.container_port == 0 {
            anyhow::bail!("container_port must be non-zero");
        }

        if self.base_port == 0 {
            anyhow::bail!("base_port must be non-zero");
        }

        if self.ready_timeout == 0 {
            anyhow::bail!("ready_timeout must be at least 1 second");
        }

        if self.dispatch_timeout == 0 {
            anyhow::bail!("dispatch_timeout must be at least 1 second");
        }

        Ok(())
    }
}
