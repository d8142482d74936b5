//! fundseries core: turns heterogeneous historical price payloads into one
//! canonical date → price series.
//!
//! - Domain types (canonical dates and prices, raw records, instruments)
//! - Date and price normalizers, one grammar per source date format
//! - Source decoders, one per payload shape, behind [`decode::SourceFormat`]
//! - Series builder with last-write-wins merging, corrections and a
//!   rejection report
//!
//! Nothing in this crate performs I/O.

pub mod decode;
pub mod domain;
pub mod series;

pub use decode::{DecodeShapeError, SourceDecoder, SourceFormat};
pub use domain::{
    CanonicalDate, CanonicalPrice, Category, DateFormat, DateNormalizer, Instrument,
    MalformedDate, MalformedPrice, PriceNormalizer, RawRecord, RecordFormat, UnitSuffix,
};
pub use series::{
    BuildOutcome, Correction, CorrectionSet, RecordError, RejectedRecord, RejectionReport,
    Series, SeriesBuilder,
};
