//! Daily NAVPU JSON as served by the UITF listing site.
//!
//! The payload is an object whose `thlabels` array holds one HTML-ish label per
//! day, e.g. `"NAVpu : <b>1.2345</b><br>Date : Jan 5, 2016"`.

use serde_json::Value;

use super::{non_empty, DecodeShapeError, SourceDecoder};
use crate::domain::RawRecord;

const DEFAULT_LABELS_KEY: &str = "thlabels";
const SEPARATOR: &str = "<br>";
const DATE_MARKER: &str = "Date : ";
const PRICE_MARKER: &str = "NAVpu : <b>";
const BOLD_CLOSE: &str = "</b>";

/// JSON object holding a list of `Date : D<br>NAVpu : <b>P</b>` labels.
#[derive(Debug, Clone)]
pub struct LabeledJsonBlob {
    labels_key: String,
}

impl LabeledJsonBlob {
    pub fn new(labels_key: impl Into<String>) -> Self {
        Self {
            labels_key: labels_key.into(),
        }
    }
}

impl Default for LabeledJsonBlob {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS_KEY)
    }
}

impl SourceDecoder for LabeledJsonBlob {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        let payload = non_empty(payload)?;
        let root: Value = serde_json::from_str(payload)
            .map_err(|e| DecodeShapeError::InvalidJson(e.to_string()))?;

        let labels = root
            .get(&self.labels_key)
            .ok_or_else(|| DecodeShapeError::MissingField(self.labels_key.clone()))?
            .as_array()
            .ok_or_else(|| DecodeShapeError::WrongType {
                field: self.labels_key.clone(),
                detail: "expected an array of strings".into(),
            })?;

        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let label = label.as_str().ok_or_else(|| DecodeShapeError::WrongType {
                    field: format!("{}[{i}]", self.labels_key),
                    detail: format!("expected a string, got {label}"),
                })?;
                let (date, price) = split_label(label);
                Ok(RawRecord::new(date, price, i + 1))
            })
            .collect()
    }
}

/// Split one label into (date, price).
///
/// Segments are assigned by their marker. Labels without markers are taken
/// positionally, price first, as the site lists them.
fn split_label(label: &str) -> (String, String) {
    let segments: Vec<&str> = label.split(SEPARATOR).collect();
    let date = segments
        .iter()
        .find(|s| s.trim_start().starts_with(DATE_MARKER));
    let price = segments
        .iter()
        .find(|s| s.trim_start().starts_with(PRICE_MARKER));

    match (date, price) {
        (Some(date), Some(price)) => (strip_markers(date), strip_markers(price)),
        _ => {
            let mut fields = segments.iter().rev().map(|s| strip_markers(s));
            let date = fields.next().unwrap_or_default();
            let price = fields.next().unwrap_or_default();
            (date, price)
        }
    }
}

fn strip_markers(segment: &str) -> String {
    segment
        .replace(PRICE_MARKER, "")
        .replace(BOLD_CLOSE, "")
        .replace(DATE_MARKER, "")
}
