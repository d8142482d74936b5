//! Payload provider trait and structured fetch errors.
//!
//! A provider turns a catalog entry into the raw payload text. The
//! [`SourceRouter`] picks the provider from the entry's declared source, so the
//! pipeline never needs to know where a payload came from.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{InstrumentSpec, SourceSpec};
use crate::uitf::UitfProvider;

/// Why a payload could not be obtained. The instrument is skipped; the rest
/// of the run continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("raw file not found: {0}")]
    MissingFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("'{name}' needs the network but the run is offline")]
    Offline { name: String },

    #[error("{provider} provider cannot serve '{name}'")]
    Unsupported {
        provider: &'static str,
        name: String,
    },
}

/// Source of raw payloads.
///
/// Implementations handle the specifics of one kind of source. Persistence
/// sits after this trait; providers never write anything.
pub trait PayloadProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the raw payload for one instrument.
    fn fetch(&self, spec: &InstrumentSpec) -> Result<String, FetchError>;
}

/// Reads payloads from files under a raw-data directory.
#[derive(Debug, Clone)]
pub struct FileProvider {
    raw_dir: PathBuf,
}

impl FileProvider {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn path_for(&self, spec: &InstrumentSpec) -> Option<PathBuf> {
        spec.raw_file_name().map(|file| self.raw_dir.join(file))
    }
}

impl PayloadProvider for FileProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, spec: &InstrumentSpec) -> Result<String, FetchError> {
        let path = self.path_for(spec).ok_or_else(|| FetchError::Unsupported {
            provider: "file",
            name: spec.name.clone(),
        })?;
        if !path.is_file() {
            return Err(FetchError::MissingFile(path));
        }
        std::fs::read_to_string(&path).map_err(|source| FetchError::Read { path, source })
    }
}

/// Dispatches each instrument to the provider its source names.
///
/// Without a UITF provider (offline runs), network sources fail with
/// [`FetchError::Offline`].
pub struct SourceRouter {
    files: FileProvider,
    uitf: Option<UitfProvider>,
}

impl SourceRouter {
    pub fn new(files: FileProvider, uitf: Option<UitfProvider>) -> Self {
        Self { files, uitf }
    }

    pub fn offline(files: FileProvider) -> Self {
        Self::new(files, None)
    }
}

impl PayloadProvider for SourceRouter {
    fn name(&self) -> &str {
        "router"
    }

    fn fetch(&self, spec: &InstrumentSpec) -> Result<String, FetchError> {
        match &spec.source {
            SourceSpec::File { .. } => self.files.fetch(spec),
            SourceSpec::Uitf { .. } => match &self.uitf {
                Some(uitf) => uitf.fetch(spec),
                None => Err(FetchError::Offline {
                    name: spec.name.clone(),
                }),
            },
        }
    }
}
