//! Domain types: canonical dates and prices, raw records, instruments.

pub mod date;
pub mod instrument;
pub mod price;
pub mod record;

pub use date::{CanonicalDate, DateFormat, DateNormalizer, MalformedDate, MAX_YEAR, MIN_YEAR};
pub use instrument::{Category, Instrument};
pub use price::{CanonicalPrice, MalformedPrice, PriceNormalizer, UnitSuffix};
pub use record::{RawRecord, RecordFormat};
