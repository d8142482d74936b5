//! Source decoders, one per upstream payload shape.
//!
//! Every decoder is a pure function from a payload to an ordered list of
//! [`RawRecord`]s. The order is the one that makes last-write-wins merging
//! chronologically correct for that source. Decoders never interpret the
//! tokens themselves; that is left to the normalizers.
//!
//! A [`SourceFormat`] tag selects the decoder and carries the source's default
//! [`RecordFormat`] (date grammar and price unit suffix).

pub mod delimited;
pub mod epoch_pairs;
pub mod json_arrays;
pub mod labeled;
pub mod tuple_list;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{DateFormat, RawRecord, RecordFormat, UnitSuffix};

pub use delimited::{
    CommaSeparatedWithHeader, TabSeparated, TabSeparatedReverseChron, TabSeparatedWithHeader,
};
pub use epoch_pairs::BracketedPairListEpoch;
pub use json_arrays::EmbeddedJsonArrays;
pub use labeled::LabeledJsonBlob;
pub use tuple_list::LiteralTupleListText;

/// The payload does not have the container shape its decoder expects.
///
/// Unlike a malformed record, nothing can be salvaged from such a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeShapeError {
    #[error("payload is empty")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing JSON field '{0}'")]
    MissingField(String),

    #[error("JSON field '{field}' has the wrong type: {detail}")]
    WrongType { field: String, detail: String },

    #[error("expected payload wrapped in '{open}' ... '{close}'")]
    Unbracketed {
        open: &'static str,
        close: &'static str,
    },

    #[error("unreadable delimited text: {0}")]
    Delimited(String),
}

/// Decodes one payload shape.
pub trait SourceDecoder {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError>;
}

/// Declared shape of an instrument's raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    LabeledJsonBlob,
    TabSeparatedReverseChron,
    TabSeparatedWithHeader,
    TabSeparated,
    EmbeddedJsonArrays,
    LiteralTupleListText,
    CommaSeparatedWithHeader,
    BracketedPairListEpoch,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 8] = [
        SourceFormat::LabeledJsonBlob,
        SourceFormat::TabSeparatedReverseChron,
        SourceFormat::TabSeparatedWithHeader,
        SourceFormat::TabSeparated,
        SourceFormat::EmbeddedJsonArrays,
        SourceFormat::LiteralTupleListText,
        SourceFormat::CommaSeparatedWithHeader,
        SourceFormat::BracketedPairListEpoch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::LabeledJsonBlob => "labeled_json_blob",
            SourceFormat::TabSeparatedReverseChron => "tab_separated_reverse_chron",
            SourceFormat::TabSeparatedWithHeader => "tab_separated_with_header",
            SourceFormat::TabSeparated => "tab_separated",
            SourceFormat::EmbeddedJsonArrays => "embedded_json_arrays",
            SourceFormat::LiteralTupleListText => "literal_tuple_list_text",
            SourceFormat::CommaSeparatedWithHeader => "comma_separated_with_header",
            SourceFormat::BracketedPairListEpoch => "bracketed_pair_list_epoch",
        }
    }

    /// Decode `payload` with this format's decoder.
    pub fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        match self {
            SourceFormat::LabeledJsonBlob => LabeledJsonBlob::default().decode(payload),
            SourceFormat::TabSeparatedReverseChron => TabSeparatedReverseChron.decode(payload),
            SourceFormat::TabSeparatedWithHeader => TabSeparatedWithHeader.decode(payload),
            SourceFormat::TabSeparated => TabSeparated.decode(payload),
            SourceFormat::EmbeddedJsonArrays => EmbeddedJsonArrays.decode(payload),
            SourceFormat::LiteralTupleListText => LiteralTupleListText.decode(payload),
            SourceFormat::CommaSeparatedWithHeader => CommaSeparatedWithHeader.decode(payload),
            SourceFormat::BracketedPairListEpoch => BracketedPairListEpoch.decode(payload),
        }
    }

    /// Date grammar the source uses unless an instrument overrides it.
    pub fn default_date_format(&self) -> DateFormat {
        match self {
            SourceFormat::LabeledJsonBlob | SourceFormat::LiteralTupleListText => {
                DateFormat::DisplayAlreadyCanonical
            }
            SourceFormat::TabSeparated => DateFormat::UsSlash,
            SourceFormat::BracketedPairListEpoch => DateFormat::EpochMillis,
            SourceFormat::TabSeparatedReverseChron
            | SourceFormat::TabSeparatedWithHeader
            | SourceFormat::EmbeddedJsonArrays
            | SourceFormat::CommaSeparatedWithHeader => DateFormat::IsoYmd,
        }
    }

    /// Unit marker the source appends to prices, if any.
    pub fn default_unit_suffix(&self) -> Option<UnitSuffix> {
        match self {
            SourceFormat::TabSeparatedReverseChron => Some(UnitSuffix::Chars(1)),
            _ => None,
        }
    }

    pub fn record_format(&self) -> RecordFormat {
        RecordFormat {
            date: self.default_date_format(),
            unit_suffix: self.default_unit_suffix(),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = SourceFormat::ALL.iter().map(|f| f.as_str()).collect();
                format!("unknown source format '{s}'. Valid: {}", valid.join(", "))
            })
    }
}

/// Reject payloads with no content at all.
pub(crate) fn non_empty(payload: &str) -> Result<&str, DecodeShapeError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        Err(DecodeShapeError::Empty)
    } else {
        Ok(trimmed)
    }
}
