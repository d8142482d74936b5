use serde::{Deserialize, Serialize};

use super::date::DateFormat;
use super::price::UnitSuffix;

/// One (date, price) pair exactly as a payload spelled it.
///
/// `position` is the 1-based line or element index inside the payload, kept so
/// rejections can point back at the offending input. A field the payload did
/// not supply is an empty token, which the normalizers reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub price: String,
    pub position: usize,
}

impl RawRecord {
    pub fn new(date: impl Into<String>, price: impl Into<String>, position: usize) -> Self {
        Self {
            date: date.into(),
            price: price.into(),
            position,
        }
    }
}

/// How one source's raw tokens are to be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFormat {
    pub date: DateFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_suffix: Option<UnitSuffix>,
}

impl RecordFormat {
    pub fn new(date: DateFormat) -> Self {
        Self {
            date,
            unit_suffix: None,
        }
    }

    pub fn with_unit_suffix(mut self, unit_suffix: UnitSuffix) -> Self {
        self.unit_suffix = Some(unit_suffix);
        self
    }
}
