//! Chart series dumps shaped like `[[epochMillis,price],...]`.

use super::{non_empty, DecodeShapeError, SourceDecoder};
use crate::domain::RawRecord;

const OPEN: &str = "[[";
const CLOSE: &str = "]]";
const PAIR_SEPARATOR: &str = "],[";

/// Bracketed list of `[epochMillis,price]` pairs.
///
/// The payload only holds numbers and punctuation, so whitespace is removed
/// before splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketedPairListEpoch;

impl SourceDecoder for BracketedPairListEpoch {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        let compact: String = non_empty(payload)?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if compact == "[]" {
            return Ok(Vec::new());
        }

        let inner = compact
            .strip_prefix(OPEN)
            .and_then(|b| b.strip_suffix(CLOSE))
            .ok_or(DecodeShapeError::Unbracketed {
                open: OPEN,
                close: CLOSE,
            })?;

        let records = inner
            .split(PAIR_SEPARATOR)
            .enumerate()
            .map(|(i, pair)| {
                let (millis, price) = pair.split_once(',').unwrap_or((pair, ""));
                RawRecord::new(millis, price, i + 1)
            })
            .collect();
        Ok(records)
    }
}
