//! fundseries runner: turns a catalog of instruments into canonical series
//! files.
//!
//! This crate builds on `fundseries-core` to provide:
//! - TOML run configuration and the instrument catalog (allow-list)
//! - Payload providers: raw files and the UITF NAVPU endpoint
//! - Output sink with per-category overwrite policy and post-hoc corrections
//! - Per-instrument pipeline and a sequential or rayon-parallel batch runner
//! - Run report with blake3 content fingerprints

pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod runner;
pub mod sink;
pub mod uitf;

pub use catalog::{Catalog, InstrumentSpec, SourceSpec};
pub use config::{ConfigError, OverwritePolicy, RunConfig, UitfConfig};
pub use pipeline::{process_instrument, PipelineError, PipelineSettings, ProcessedInstrument};
pub use provider::{FetchError, FileProvider, PayloadProvider, SourceRouter};
pub use report::{series_fingerprint, InstrumentReport, InstrumentStatus, RunReport};
pub use runner::{
    run_catalog, run_instruments, InstrumentRun, RunError, RunProgress, RunSummary, StdoutProgress,
};
pub use sink::{sanitize_file_stem, to_persisted_json, OutputSink, SinkError, WriteOutcome};
pub use uitf::{navpu_url, UitfProvider};
