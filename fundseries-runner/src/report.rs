//! Run report: per-instrument outcome, counts and content fingerprints.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use fundseries_core::{Category, RejectionReport, Series};

use crate::runner::RunSummary;
use crate::sink::{to_persisted_json, SinkError, WriteOutcome};

/// What happened to one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentStatus {
    Created,
    Overwritten,
    SkippedExisting,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub name: String,
    pub status: InstrumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub entries: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
    /// blake3 of the persisted JSON text. For skipped writes this is the
    /// file already on disk, as are `entries` and the date range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<RejectionReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serializable summary of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: NaiveDateTime,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub instruments: Vec<InstrumentReport>,
}

/// Content fingerprint of a series: blake3 of its persisted JSON.
pub fn series_fingerprint(series: &Series) -> Result<String, SinkError> {
    let json = to_persisted_json(series)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// What the series file on disk holds after the run.
struct FileContents {
    entries: usize,
    first_date: Option<String>,
    last_date: Option<String>,
    hash: String,
}

impl FileContents {
    fn of_series(series: &Series) -> Result<Self, SinkError> {
        Ok(Self {
            entries: series.len(),
            first_date: series.first_date().map(|d| d.render()),
            last_date: series.last_date().map(|d| d.render()),
            hash: series_fingerprint(series)?,
        })
    }

    /// Describe a file the run left untouched. Keys are taken as written.
    fn read(path: &Path) -> Result<Self, SinkError> {
        let bytes = fs::read(path).map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map: Map<String, Value> =
            serde_json::from_slice(&bytes).map_err(|e| SinkError::InvalidFile {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            entries: map.len(),
            first_date: map.keys().next().cloned(),
            last_date: map.keys().next_back().cloned(),
            hash: blake3::hash(&bytes).to_hex().to_string(),
        })
    }
}

impl RunReport {
    pub fn from_summary(summary: &RunSummary) -> Result<Self, SinkError> {
        let mut instruments = Vec::with_capacity(summary.runs.len());
        for run in &summary.runs {
            let report = match &run.result {
                Ok(done) => {
                    let series = &done.instrument.series;
                    let (status, contents) = match &done.write {
                        WriteOutcome::Created(_) => {
                            (InstrumentStatus::Created, FileContents::of_series(series)?)
                        }
                        WriteOutcome::Overwritten(_) => {
                            (InstrumentStatus::Overwritten, FileContents::of_series(series)?)
                        }
                        WriteOutcome::SkippedExisting(path) => {
                            (InstrumentStatus::SkippedExisting, FileContents::read(path)?)
                        }
                    };
                    InstrumentReport {
                        name: run.name.clone(),
                        status,
                        category: Some(done.instrument.category),
                        path: Some(done.write.path().display().to_string()),
                        entries: contents.entries,
                        first_date: contents.first_date,
                        last_date: contents.last_date,
                        content_hash: Some(contents.hash),
                        records: Some(done.report.clone()),
                        error_kind: None,
                        error: None,
                    }
                }
                Err(e) => InstrumentReport {
                    name: run.name.clone(),
                    status: InstrumentStatus::Failed,
                    category: None,
                    path: None,
                    entries: 0,
                    first_date: None,
                    last_date: None,
                    content_hash: None,
                    records: None,
                    error_kind: Some(e.kind().to_string()),
                    error: Some(e.to_string()),
                },
            };
            instruments.push(report);
        }

        Ok(Self {
            generated_at: chrono::Local::now().naive_local(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            instruments,
        })
    }

    pub fn get(&self, name: &str) -> Option<&InstrumentReport> {
        self.instruments.iter().find(|i| i.name == name)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
