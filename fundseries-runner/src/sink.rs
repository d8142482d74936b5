//! Output sink: persisted series files and the overwrite policy.
//!
//! Layout: `{data_dir}/{sanitized name}.json`, one JSON object per
//! instrument, keys in chronological order, written with `", "` and `": "`
//! separators so files diff cleanly against ones produced by earlier tools.
//!
//! Writes are atomic (write to .tmp, rename into place).

use log::info;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use fundseries_core::{Category, CorrectionSet, Series};

use crate::config::OverwritePolicy;

const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const FALLBACK_STEM: &str = "instrument";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to serialize series: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{path} is not a series file: {detail}")]
    InvalidFile { path: PathBuf, detail: String },

    #[error("no series file at {0}")]
    NotFound(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What happened to an instrument's output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created(PathBuf),
    Overwritten(PathBuf),
    /// The file existed and the category's overwrite flag was off.
    SkippedExisting(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Created(p)
            | WriteOutcome::Overwritten(p)
            | WriteOutcome::SkippedExisting(p) => p,
        }
    }

    pub fn was_written(&self) -> bool {
        !matches!(self, WriteOutcome::SkippedExisting(_))
    }
}

/// Writes canonical series files under one data directory.
#[derive(Debug, Clone)]
pub struct OutputSink {
    data_dir: PathBuf,
    overwrite: OverwritePolicy,
}

impl OutputSink {
    pub fn new(data_dir: impl Into<PathBuf>, overwrite: OverwritePolicy) -> Self {
        Self {
            data_dir: data_dir.into(),
            overwrite,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `{data_dir}/{sanitized name}.json`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_file_stem(name)))
    }

    /// Write `series` unless the file exists and `category` may not overwrite.
    pub fn write(
        &self,
        name: &str,
        category: Category,
        series: &Series,
    ) -> Result<WriteOutcome, SinkError> {
        let path = self.path_for(name);
        let existed = path.exists();
        if existed && !self.overwrite.allows(category) {
            info!("{name}: {} exists, not overwriting", path.display());
            return Ok(WriteOutcome::SkippedExisting(path));
        }

        let json = to_persisted_json(series)?;
        fs::create_dir_all(&self.data_dir).map_err(io_err(&self.data_dir))?;
        write_atomic(&path, json.as_bytes())?;

        Ok(if existed {
            WriteOutcome::Overwritten(path)
        } else {
            WriteOutcome::Created(path)
        })
    }

    /// Read a persisted file back as an ordered key → value map.
    ///
    /// Keys are returned as written, without canonical-date validation, so
    /// files holding raw keys can still be corrected.
    pub fn read_raw(&self, name: &str) -> Result<Map<String, Value>, SinkError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(SinkError::NotFound(path));
        }
        let content = fs::read_to_string(&path).map_err(io_err(&path))?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(SinkError::InvalidFile {
                path,
                detail: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(SinkError::InvalidFile {
                path,
                detail: e.to_string(),
            }),
        }
    }

    /// Remove corrected keys from an existing file, keeping the rest in order.
    ///
    /// Returns the removed keys. The file is rewritten only when something
    /// was removed. Corrections are explicit edits, so the overwrite policy
    /// does not apply.
    pub fn apply_corrections(
        &self,
        name: &str,
        corrections: &CorrectionSet,
    ) -> Result<Vec<String>, SinkError> {
        let map = self.read_raw(name)?;
        let (removed, kept): (Vec<_>, Vec<_>) = map
            .into_iter()
            .partition(|(key, _)| corrections.matches_key(key));

        if !removed.is_empty() {
            let kept: Map<String, Value> = kept.into_iter().collect();
            let json = to_spaced_json(&kept)?;
            write_atomic(&self.path_for(name), json.as_bytes())?;
        }
        Ok(removed.into_iter().map(|(key, _)| key).collect())
    }
}

/// File-name-safe form of an instrument name.
///
/// Path separators, reserved characters and control characters become `_`;
/// surrounding whitespace and dots are trimmed.
pub fn sanitize_file_stem(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The persisted JSON text of a series.
pub fn to_persisted_json(series: &Series) -> Result<String, SinkError> {
    to_spaced_json(series)
}

fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> Result<String, SinkError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    // serde_json only emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Compact JSON with a space after each `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, bytes).map_err(io_err(&tmp_path))?;
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        SinkError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
