//! Batch runner. Processes catalog instruments with progress reporting.
//!
//! Instruments are independent: each owns its series from fetch to write, and
//! a failure in one never stops the others. With `parallel` set they run on
//! the rayon pool; results always come back in catalog order.

use log::info;
use rayon::prelude::*;
use thiserror::Error;

use crate::catalog::{Catalog, InstrumentSpec};
use crate::config::{ConfigError, RunConfig};
use crate::pipeline::{process_instrument, PipelineError, PipelineSettings, ProcessedInstrument};
use crate::provider::{FetchError, FileProvider, PayloadProvider, SourceRouter};
use crate::sink::OutputSink;
use crate::uitf::UitfProvider;

/// Errors that stop a run before any instrument is processed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("provider setup failed: {0}")]
    Provider(#[from] FetchError),
}

/// Progress callback for batch runs.
pub trait RunProgress: Send + Sync {
    /// Called when an instrument starts.
    fn on_start(&self, name: &str, index: usize, total: usize);

    /// Called when an instrument finishes, successfully or not.
    fn on_complete(
        &self,
        name: &str,
        index: usize,
        total: usize,
        result: &Result<ProcessedInstrument, PipelineError>,
    );

    /// Called once every instrument is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Prints progress lines to stdout.
pub struct StdoutProgress;

impl RunProgress for StdoutProgress {
    fn on_start(&self, name: &str, index: usize, total: usize) {
        println!("[{}/{}] {name}...", index + 1, total);
    }

    fn on_complete(
        &self,
        name: &str,
        _index: usize,
        _total: usize,
        result: &Result<ProcessedInstrument, PipelineError>,
    ) {
        match result {
            Ok(done) if done.write.was_written() => println!(
                "  OK: {name} ({} entries) -> {}",
                done.instrument.series.len(),
                done.write.path().display()
            ),
            Ok(done) => println!("  KEEP: {name}: {} exists", done.write.path().display()),
            Err(e) => println!("  FAIL: {name}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nRun complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Outcome of one instrument within a batch.
#[derive(Debug)]
pub struct InstrumentRun {
    pub name: String,
    pub result: Result<ProcessedInstrument, PipelineError>,
}

/// Summary of a batch run, in catalog order.
#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub runs: Vec<InstrumentRun>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.runs
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (r.name.as_str(), e)))
    }
}

/// Process `specs` against one provider and sink.
pub fn run_instruments(
    specs: &[&InstrumentSpec],
    provider: &dyn PayloadProvider,
    sink: &OutputSink,
    settings: &PipelineSettings,
    parallel: bool,
    progress: &dyn RunProgress,
) -> RunSummary {
    let total = specs.len();
    let run_one = |(index, spec): (usize, &&InstrumentSpec)| {
        progress.on_start(&spec.name, index, total);
        let result = process_instrument(spec, provider, sink, settings);
        progress.on_complete(&spec.name, index, total, &result);
        InstrumentRun {
            name: spec.name.clone(),
            result,
        }
    };

    let runs: Vec<InstrumentRun> = if parallel {
        specs.par_iter().enumerate().map(run_one).collect()
    } else {
        specs.iter().enumerate().map(run_one).collect()
    };

    let succeeded = runs.iter().filter(|r| r.result.is_ok()).count();
    let failed = total - succeeded;
    progress.on_batch_complete(succeeded, failed, total);

    RunSummary {
        total,
        succeeded,
        failed,
        runs,
    }
}

/// Process the selected catalog entries as configured.
///
/// The HTTP client is only built when a selected instrument needs the network
/// and the run is not offline.
pub fn run_catalog(
    config: &RunConfig,
    catalog: &Catalog,
    only: &[String],
    progress: &dyn RunProgress,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let specs = catalog.select(only)?;

    let needs_network = specs.iter().any(|s| s.source.needs_network());
    let uitf = if needs_network && !config.offline {
        Some(UitfProvider::new(config.uitf.clone())?)
    } else {
        None
    };
    let router = SourceRouter::new(FileProvider::new(&config.raw_dir), uitf);
    let sink = OutputSink::new(&config.data_dir, config.overwrite);

    info!(
        "processing {} instrument(s) from {} into {}{}",
        specs.len(),
        config.raw_dir.display(),
        config.data_dir.display(),
        if config.parallel { " (parallel)" } else { "" }
    );

    Ok(run_instruments(
        &specs,
        &router,
        &sink,
        &PipelineSettings::from(config),
        config.parallel,
        progress,
    ))
}
