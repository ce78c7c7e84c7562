//! JSON report output

use crate::error::{Error, Result};
use crate::orchestrator::RunReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Serializable snapshot of a finished run
#[derive(Debug, Serialize)]
pub struct JsonReport {
    /// Merged counts keyed by word, alphabetically ordered
    pub counts: BTreeMap<String, u64>,
    pub unique_words: usize,
    pub total_words: u64,
    pub files: usize,
    pub processed: usize,
    pub skipped: Vec<JsonSkippedInput>,
    pub teardown: JsonTeardown,
    pub elapsed_seconds: f64,
}

/// One input that was skipped after a worker failure
#[derive(Debug, Serialize)]
pub struct JsonSkippedInput {
    pub index: usize,
    pub source: String,
    pub error: String,
}

/// Teardown outcome
#[derive(Debug, Serialize)]
pub struct JsonTeardown {
    pub removed: usize,
    pub failures: Vec<String>,
}

impl JsonReport {
    /// Build the serializable snapshot from a run report
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            counts: report
                .combined
                .counts()
                .iter()
                .map(|(word, count)| (word.clone(), *count))
                .collect(),
            unique_words: report.combined.unique_words(),
            total_words: report.combined.total_words(),
            files: report.items,
            processed: report.processed,
            skipped: report
                .failures
                .iter()
                .map(|failure| JsonSkippedInput {
                    index: failure.index,
                    source: failure.source.display().to_string(),
                    error: failure.error.to_string(),
                })
                .collect(),
            teardown: JsonTeardown {
                removed: report.teardown.removed,
                failures: report
                    .teardown
                    .failures
                    .iter()
                    .map(|failure| {
                        format!("{} ({}): {}", failure.name, failure.id, failure.error)
                    })
                    .collect(),
            },
            elapsed_seconds: report.duration.as_secs_f64(),
        }
    }
}

/// Write the report as pretty-printed JSON
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::to_writer_pretty(file, &JsonReport::from_report(report)).map_err(|source| {
        Error::ReportWrite {
            path: path.to_path_buf(),
            source: source.into(),
        }
    })?;

    Ok(())
}
