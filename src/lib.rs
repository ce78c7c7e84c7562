//! WordFleet - Distributed word-count orchestrator
//!
//! WordFleet counts words across a fleet of containerized workers: one
//! container per input file, each serving a small JSON-over-HTTP
//! counting protocol, with the per-file results merged into one tally.
//!
//! # Architecture
//!
//! - **Provisioning**: one Docker container per input, sequential host ports, TCP readiness probes
//! - **Dispatch**: JSON-over-HTTP worker protocol with per-request timeouts
//! - **Aggregation**: order-independent merge of per-worker counts
//! - **Orchestration**: validate, provision, dispatch, aggregate; teardown guaranteed
//!
//! A worker failure normally skips that one input and degrades the run
//! instead of aborting it. Teardown runs in every case, so containers
//! never outlive the run that created them.

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod provision;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use aggregate::CombinedResult;
pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, RunReport};
