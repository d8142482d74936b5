//! Chart-widget JSON with parallel `category` / `values` arrays.

use serde::Deserialize;
use serde_json::value::RawValue;

use super::{non_empty, DecodeShapeError, SourceDecoder};
use crate::domain::{PriceNormalizer, RawRecord};

/// JSON object with parallel arrays of dates (`category`) and prices (`values`).
///
/// Arrays are zipped by index. Numeric prices keep the exact literal the
/// source wrote (`100.0` stays `100.0`); literals in exponent form are
/// expanded to plain decimals. When the arrays differ in length the unmatched
/// tail still produces records, with the missing side empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedJsonArrays;

#[derive(Deserialize)]
struct ChartArrays {
    category: Vec<Box<RawValue>>,
    values: Vec<Box<RawValue>>,
}

impl SourceDecoder for EmbeddedJsonArrays {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        let payload = non_empty(payload)?;
        let arrays: ChartArrays = serde_json::from_str(payload).map_err(|e| {
            if e.is_data() {
                DecodeShapeError::WrongType {
                    field: "category/values".into(),
                    detail: e.to_string(),
                }
            } else {
                DecodeShapeError::InvalidJson(e.to_string())
            }
        })?;

        let len = arrays.category.len().max(arrays.values.len());
        let records = (0..len)
            .map(|i| {
                let date = arrays
                    .category
                    .get(i)
                    .map(|v| token_text(v))
                    .unwrap_or_default();
                let price = arrays
                    .values
                    .get(i)
                    .map(|v| price_text(v))
                    .unwrap_or_default();
                RawRecord::new(date, price, i + 1)
            })
            .collect();
        Ok(records)
    }
}

/// Text of a JSON scalar: strings unquoted, `null` empty, anything else literal.
fn token_text(raw: &RawValue) -> String {
    let text = raw.get().trim();
    if text.starts_with('"') {
        serde_json::from_str::<String>(text).unwrap_or_default()
    } else if text == "null" {
        String::new()
    } else {
        text.to_string()
    }
}

fn price_text(raw: &RawValue) -> String {
    let text = token_text(raw);
    let is_exponent_literal = !raw.get().trim_start().starts_with('"')
        && text.contains(|c| c == 'e' || c == 'E');
    if !is_exponent_literal {
        return text;
    }
    match text.parse::<f64>() {
        Ok(value) => PriceNormalizer::parse_number(value)
            .map(|p| p.into_string())
            .unwrap_or(text),
        Err(_) => text,
    }
}
