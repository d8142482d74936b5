//! Printed list of string 2-tuples, e.g. `[('Jan 5, 2016', '1.2345'), ...]`.

use super::{non_empty, DecodeShapeError, SourceDecoder};
use crate::domain::RawRecord;

const OPEN: &str = "[('";
const CLOSE: &str = "')]";
const TUPLE_SEPARATOR: &str = "'), ('";
const FIELD_SEPARATOR: &str = "', '";

/// One line shaped like a printed list of `(date, price)` string tuples.
///
/// Dates are expected in display form and are only revalidated downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralTupleListText;

impl SourceDecoder for LiteralTupleListText {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        let body = non_empty(payload)?;
        if body == "[]" {
            return Ok(Vec::new());
        }

        let inner = body
            .strip_prefix(OPEN)
            .and_then(|b| b.strip_suffix(CLOSE))
            .ok_or(DecodeShapeError::Unbracketed {
                open: OPEN,
                close: CLOSE,
            })?;

        let records = inner
            .split(TUPLE_SEPARATOR)
            .enumerate()
            .map(|(i, tuple)| {
                let (date, price) = tuple.split_once(FIELD_SEPARATOR).unwrap_or((tuple, ""));
                RawRecord::new(date.trim(), price.trim(), i + 1)
            })
            .collect();
        Ok(records)
    }
}
