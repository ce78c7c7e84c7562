//! Error types
//!
//! Every fallible operation in the library returns a typed error from this
//! module. The orchestrator decides per kind whether a failure aborts the run
//! or degrades it (skip the affected input, keep going); the binary converts
//! the top-level [`Error`] into an anyhow chain at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid run configuration, detected before any resource is allocated.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The worker count and the number of input files must match 1:1
    #[error("worker count is {workers} but {files} input file(s) were given")]
    ArityMismatch { workers: usize, files: usize },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("port span {span} is too small for {workers} worker(s)")]
    PortSpanTooSmall { span: u16, workers: usize },

    #[error("{0}")]
    Invalid(String),
}

/// Failure to create, start, ready-check, or remove a worker container.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Underlying Docker API call failed
    #[error("docker: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// The container backend refused an operation (also produced by the
    /// mock runtime in tests)
    #[error("failed to {operation} container {name}: {message}")]
    Container {
        operation: &'static str,
        name: String,
        message: String,
    },

    #[error("no free host port in {start}..{end}")]
    PortsExhausted { start: u16, end: u16 },

    #[error("worker {worker} at {endpoint} did not accept connections within {timeout_ms} ms")]
    ReadyTimeout {
        worker: usize,
        endpoint: String,
        timeout_ms: u64,
    },
}

/// Failure to deliver one work item to a worker or to decode its answer.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection-level failure, typically refused or reset
    #[error("worker at {endpoint} unreachable: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} timed out after {timeout_ms} ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("worker at {endpoint} returned status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("worker at {endpoint} returned an undecodable body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Top-level error for an orchestration run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("failed to write report to {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type used throughout WordFleet
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_mismatch_message() {
        let err = ConfigError::ArityMismatch {
            workers: 3,
            files: 1,
        };
        assert_eq!(
            err.to_string(),
            "worker count is 3 but 1 input file(s) were given"
        );
    }

    #[test]
    fn test_file_read_includes_path() {
        let err = Error::FileRead {
            path: PathBuf::from("/tmp/missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.txt"));
    }

    #[test]
    fn test_config_error_converts_to_run_error() {
        fn fails() -> Result<()> {
            Err(ConfigError::NoWorkers)?
        }
        match fails() {
            Err(Error::Config(ConfigError::NoWorkers)) => {}
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
