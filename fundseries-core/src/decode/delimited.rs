//! Line-oriented `date<sep>price` exports.
//!
//! Fields are split naively on the delimiter (no quoting rules) and trimmed.
//! Blank lines are ignored. A line without a second field yields an empty
//! price token so the rejection shows up in the build report.

use csv::{ReaderBuilder, Trim};

use super::{non_empty, DecodeShapeError, SourceDecoder};
use crate::domain::RawRecord;

/// Tab-separated, newest first, prices carry a trailing unit character.
///
/// Records come out oldest first so later duplicates win chronologically.
/// The unit character is left on the token; the format declares it as the
/// price unit suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabSeparatedReverseChron;

/// Tab-separated with a header line that is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabSeparatedWithHeader;

/// Tab-separated, no header, chronological.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabSeparated;

/// Comma-separated with a header line that is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommaSeparatedWithHeader;

impl SourceDecoder for TabSeparatedReverseChron {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        let mut records = read_pairs(payload, b'\t', false)?;
        records.reverse();
        Ok(records)
    }
}

impl SourceDecoder for TabSeparatedWithHeader {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        read_pairs(payload, b'\t', true)
    }
}

impl SourceDecoder for TabSeparated {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        read_pairs(payload, b'\t', false)
    }
}

impl SourceDecoder for CommaSeparatedWithHeader {
    fn decode(&self, payload: &str) -> Result<Vec<RawRecord>, DecodeShapeError> {
        read_pairs(payload, b',', true)
    }
}

fn read_pairs(
    payload: &str,
    delimiter: u8,
    has_header: bool,
) -> Result<Vec<RawRecord>, DecodeShapeError> {
    let payload = non_empty(payload)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_header)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(payload.as_bytes());

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| DecodeShapeError::Delimited(e.to_string()))?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row
            .position()
            .map_or(records.len() + 1, |p| p.line() as usize);
        records.push(RawRecord::new(
            row.get(0).unwrap_or_default(),
            row.get(1).unwrap_or_default(),
            line,
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(records: &[RawRecord]) -> Vec<(&str, &str)> {
        records
            .iter()
            .map(|r| (r.date.as_str(), r.price.as_str()))
            .collect()
    }

    #[test]
    fn reverse_chron_yields_oldest_first_with_unit_kept() {
        let payload = "2016-01-06\t1.2400P\n2016-01-05\t1.2345P\n";
        let records = TabSeparatedReverseChron.decode(payload).unwrap();
        assert_eq!(
            pairs(&records),
            vec![("2016-01-05", "1.2345P"), ("2016-01-06", "1.2400P")]
        );
        assert_eq!(records[0].position, 2);
        assert_eq!(records[1].position, 1);
    }

    #[test]
    fn header_line_is_discarded() {
        let payload = "date\tnavps\n2016-01-05\t1.2345\n2016-01-06\t1.2400\n";
        let records = TabSeparatedWithHeader.decode(payload).unwrap();
        assert_eq!(
            pairs(&records),
            vec![("2016-01-05", "1.2345"), ("2016-01-06", "1.2400")]
        );
    }

    #[test]
    fn plain_tab_keeps_first_line() {
        let payload = "01/04/2016\t7,000.1\r\n01/05/2016\t7100.25\r\n";
        let records = TabSeparated.decode(payload).unwrap();
        assert_eq!(
            pairs(&records),
            vec![("01/04/2016", "7,000.1"), ("01/05/2016", "7100.25")]
        );
    }

    #[test]
    fn csv_header_is_discarded_and_extra_columns_ignored() {
        let payload = "name,navpu\n2015-01-02,100.0000,extra\n2015-01-05,101.2500\n";
        let records = CommaSeparatedWithHeader.decode(payload).unwrap();
        assert_eq!(
            pairs(&records),
            vec![("2015-01-02", "100.0000"), ("2015-01-05", "101.2500")]
        );
    }

    #[test]
    fn header_only_payload_has_no_records() {
        assert!(CommaSeparatedWithHeader.decode("date,close\n").unwrap().is_empty());
    }

    #[test]
    fn blank_lines_are_skipped_and_missing_fields_become_empty() {
        let payload = "2016-01-05\t1.1\n\n   \n2016-01-06\n";
        let records = TabSeparated.decode(payload).unwrap();
        assert_eq!(
            pairs(&records),
            vec![("2016-01-05", "1.1"), ("2016-01-06", "")]
        );
    }

    #[test]
    fn quotes_are_not_interpreted() {
        let records = TabSeparated.decode("\"2016-01-05\"\t1.1\n").unwrap();
        assert_eq!(records[0].date, "\"2016-01-05\"");
    }
}
