//! One instrument, start to finish: fetch → decode → build → write.

use log::{info, warn};
use thiserror::Error;

use fundseries_core::{DecodeShapeError, Instrument, RejectionReport, SeriesBuilder};

use crate::catalog::InstrumentSpec;
use crate::config::RunConfig;
use crate::provider::{FetchError, PayloadProvider};
use crate::sink::{OutputSink, SinkError, WriteOutcome};

/// Why an instrument produced no output this run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("payload has the wrong shape: {0}")]
    Decode(#[from] DecodeShapeError),

    #[error(
        "rejected {rejected} of {total} records ({:.1}%), above the {:.1}% limit",
        .ratio * 100.0,
        .max_ratio * 100.0
    )]
    RejectThresholdExceeded {
        rejected: usize,
        total: usize,
        ratio: f64,
        max_ratio: f64,
    },

    #[error("write failed: {0}")]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Short stable label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Decode(_) => "decode",
            PipelineError::RejectThresholdExceeded { .. } => "reject_threshold",
            PipelineError::Sink(_) => "sink",
        }
    }
}

/// The knobs of [`RunConfig`] that apply per instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub max_reject_ratio: f64,
    pub fail_on_reject_ratio: bool,
    pub sample_limit: usize,
}

impl From<&RunConfig> for PipelineSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            max_reject_ratio: config.max_reject_ratio,
            fail_on_reject_ratio: config.fail_on_reject_ratio,
            sample_limit: config.sample_limit,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

/// A successfully processed instrument.
#[derive(Debug, Clone)]
pub struct ProcessedInstrument {
    pub instrument: Instrument,
    pub report: RejectionReport,
    pub write: WriteOutcome,
}

/// Fetch, normalize and persist one instrument.
pub fn process_instrument(
    spec: &InstrumentSpec,
    provider: &dyn PayloadProvider,
    sink: &OutputSink,
    settings: &PipelineSettings,
) -> Result<ProcessedInstrument, PipelineError> {
    let payload = provider.fetch(spec).map_err(|e| {
        warn!("{}: {e}", spec.name);
        e
    })?;

    let outcome = SeriesBuilder::new(spec.record_format())
        .with_corrections(spec.correction_set())
        .with_sample_limit(settings.sample_limit)
        .build_payload(spec.format, &payload)?;
    let report = outcome.report;

    if report.rejected > 0 {
        let exceeded = report.exceeds(settings.max_reject_ratio);
        let line = format!(
            "{}: rejected {}/{} records: {}",
            spec.name,
            report.rejected,
            report.total,
            report.sample_summary()
        );
        if exceeded {
            warn!("{line}");
        } else {
            info!("{line}");
        }
        if exceeded && settings.fail_on_reject_ratio {
            return Err(PipelineError::RejectThresholdExceeded {
                rejected: report.rejected,
                total: report.total,
                ratio: report.reject_ratio(),
                max_ratio: settings.max_reject_ratio,
            });
        }
    }
    if outcome.series.is_empty() {
        warn!("{}: no usable records in payload", spec.name);
    }

    let write = sink.write(&spec.name, spec.category, &outcome.series)?;
    Ok(ProcessedInstrument {
        instrument: Instrument::new(spec.name.clone(), spec.category, outcome.series),
        report,
        write,
    })
}
