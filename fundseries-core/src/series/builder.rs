//! Folds decoded records into a [`Series`].
//!
//! For each record, in decoder order:
//! 1. a raw-key correction on the date token drops it;
//! 2. date and price are normalized independently, and a failure is
//!    recorded and skipped;
//! 3. a date correction on the canonical date drops it;
//! 4. the pair is inserted, replacing any earlier price for that date.

use log::debug;
use thiserror::Error;

use super::correction::CorrectionSet;
use super::report::{RejectedRecord, RejectionReport, DEFAULT_SAMPLE_LIMIT};
use super::Series;
use crate::decode::{DecodeShapeError, SourceFormat};
use crate::domain::{
    CanonicalDate, CanonicalPrice, DateNormalizer, MalformedDate, MalformedPrice,
    PriceNormalizer, RawRecord, RecordFormat,
};

/// Why a single record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("malformed date: {0}")]
    Date(#[from] MalformedDate),

    #[error("malformed price: {0}")]
    Price(#[from] MalformedPrice),
}

impl RecordError {
    pub fn token(&self) -> &str {
        match self {
            RecordError::Date(e) => e.token(),
            RecordError::Price(e) => e.token(),
        }
    }
}

/// The series built from one payload, with its accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub series: Series,
    pub report: RejectionReport,
}

/// Builds a series from records of one source.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    format: RecordFormat,
    corrections: CorrectionSet,
    sample_limit: usize,
}

impl SeriesBuilder {
    pub fn new(format: RecordFormat) -> Self {
        Self {
            format,
            corrections: CorrectionSet::new(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    /// Builder with the source format's default date grammar and unit suffix.
    pub fn for_source(format: SourceFormat) -> Self {
        Self::new(format.record_format())
    }

    pub fn with_corrections(mut self, corrections: CorrectionSet) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn with_sample_limit(mut self, sample_limit: usize) -> Self {
        self.sample_limit = sample_limit;
        self
    }

    pub fn format(&self) -> &RecordFormat {
        &self.format
    }

    /// Normalize one record without touching any series.
    ///
    /// Date and price are checked independently; on failure every malformed
    /// field is returned, date first.
    pub fn normalize(
        &self,
        record: &RawRecord,
    ) -> Result<(CanonicalDate, CanonicalPrice), Vec<RecordError>> {
        let date = DateNormalizer::parse(&record.date, self.format.date);
        let price = PriceNormalizer::parse_text(&record.price, self.format.unit_suffix.as_ref());
        match (date, price) {
            (Ok(date), Ok(price)) => Ok((date, price)),
            (date, price) => Err(date
                .err()
                .map(RecordError::from)
                .into_iter()
                .chain(price.err().map(RecordError::from))
                .collect()),
        }
    }

    pub fn build<I>(&self, records: I) -> BuildOutcome
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut series = Series::new();
        let mut report = RejectionReport::default();

        for record in records {
            report.total += 1;

            if self.corrections.matches_raw(&record.date) {
                debug!("#{}: dropped raw key '{}'", record.position, record.date);
                report.corrected += 1;
                continue;
            }

            let (date, price) = match self.normalize(&record) {
                Ok(pair) => pair,
                Err(errors) => {
                    report.rejected += 1;
                    for e in errors {
                        debug!("#{}: rejected: {e}", record.position);
                        if report.samples.len() < self.sample_limit {
                            report.samples.push(RejectedRecord {
                                position: record.position,
                                token: e.token().to_string(),
                                reason: e.to_string(),
                            });
                        }
                    }
                    continue;
                }
            };

            if self.corrections.matches_date(&date) {
                debug!("#{}: dropped corrected date {date}", record.position);
                report.corrected += 1;
                continue;
            }

            report.accepted += 1;
            if series.insert(date, price).is_some() {
                report.overwritten += 1;
            }
        }

        BuildOutcome { series, report }
    }

    /// Decode `payload` as `source` and build from the result.
    ///
    /// Tokens are read with this builder's format, which may differ from the
    /// source's defaults.
    pub fn build_payload(
        &self,
        source: SourceFormat,
        payload: &str,
    ) -> Result<BuildOutcome, DecodeShapeError> {
        let records = source.decode(payload)?;
        Ok(self.build(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateFormat, UnitSuffix};
    use crate::series::Correction;

    fn rec(date: &str, price: &str, position: usize) -> RawRecord {
        RawRecord::new(date, price, position)
    }

    fn rendered(series: &Series) -> Vec<(String, String)> {
        series
            .iter()
            .map(|(d, p)| (d.render(), p.to_string()))
            .collect()
    }

    #[test]
    fn later_duplicate_wins() {
        let builder = SeriesBuilder::new(RecordFormat::new(DateFormat::IsoYmd));
        let outcome = builder.build(vec![
            rec("2016-01-05", "1.0", 1),
            rec("2016-01-06", "2.0", 2),
            rec("2016-01-05", "3.0", 3),
        ]);
        assert_eq!(
            rendered(&outcome.series),
            vec![
                ("Jan 5, 2016".to_string(), "3.0".to_string()),
                ("Jan 6, 2016".to_string(), "2.0".to_string()),
            ]
        );
        assert_eq!(outcome.report.accepted, 3);
        assert_eq!(outcome.report.overwritten, 1);
    }

    #[test]
    fn bad_records_are_reported_and_skipped() {
        let builder = SeriesBuilder::new(RecordFormat::new(DateFormat::IsoYmd));
        let outcome = builder.build(vec![
            rec("2016-13-40", "1.0", 1),
            rec("2016-01-05", "-1.0", 2),
            rec("2016-01-06", "", 3),
            rec("2016-01-07", "4.5", 4),
        ]);
        assert_eq!(outcome.series.len(), 1);
        let report = &outcome.report;
        assert_eq!((report.total, report.accepted, report.rejected), (4, 1, 3));
        let tokens: Vec<&str> = report.samples.iter().map(|s| s.token.as_str()).collect();
        assert_eq!(tokens, vec!["2016-13-40", "-1.0", ""]);
        assert_eq!(report.samples[1].position, 2);
    }

    #[test]
    fn both_malformed_fields_are_reported() {
        let builder = SeriesBuilder::new(RecordFormat::new(DateFormat::IsoYmd));
        let outcome = builder.build(vec![rec("bad-date", "bad-price", 7)]);
        assert_eq!(outcome.report.rejected, 1);
        let samples: Vec<(usize, &str)> = outcome
            .report
            .samples
            .iter()
            .map(|s| (s.position, s.token.as_str()))
            .collect();
        assert_eq!(samples, vec![(7, "bad-date"), (7, "bad-price")]);

        let errors = builder.normalize(&rec("bad-date", "bad-price", 7)).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [RecordError::Date(_), RecordError::Price(_)]
        ));
    }

    #[test]
    fn sample_limit_caps_samples_not_counts() {
        let builder =
            SeriesBuilder::new(RecordFormat::new(DateFormat::IsoYmd)).with_sample_limit(1);
        let outcome = builder.build((1..=4).map(|i| rec("bad", "1", i)));
        assert_eq!(outcome.report.rejected, 4);
        assert_eq!(outcome.report.samples.len(), 1);
    }

    #[test]
    fn corrections_drop_entries_wherever_they_appear() {
        let corrections: CorrectionSet = [
            Correction::Date(CanonicalDate::from_ymd(2016, 1, 6).unwrap()),
            Correction::Raw(" 26, 2016".into()),
        ]
        .into_iter()
        .collect();
        let builder = SeriesBuilder::new(RecordFormat::new(DateFormat::DisplayAlreadyCanonical))
            .with_corrections(corrections);
        let outcome = builder.build(vec![
            rec("Jan 6, 2016", "9.0", 1),
            rec(" 26, 2016", "1.0", 2),
            rec("Jan 5, 2016", "1.5", 3),
            rec("Jan 06, 2016", "9.5", 4),
        ]);
        assert_eq!(
            rendered(&outcome.series),
            vec![("Jan 5, 2016".to_string(), "1.5".to_string())]
        );
        assert_eq!(outcome.report.corrected, 3);
        assert_eq!(outcome.report.rejected, 0);
    }

    #[test]
    fn unit_suffix_comes_from_format() {
        let format = RecordFormat::new(DateFormat::IsoYmd).with_unit_suffix(UnitSuffix::Chars(1));
        let outcome = SeriesBuilder::new(format).build(vec![rec("2016-01-05", "1.2345P", 1)]);
        assert_eq!(
            rendered(&outcome.series),
            vec![("Jan 5, 2016".to_string(), "1.2345".to_string())]
        );
    }

    #[test]
    fn build_payload_uses_builder_format() {
        let builder = SeriesBuilder::new(RecordFormat::new(DateFormat::UsSlash));
        let outcome = builder
            .build_payload(SourceFormat::TabSeparated, "01/04/2016\t7000.1\n")
            .unwrap();
        assert_eq!(
            rendered(&outcome.series),
            vec![("Jan 4, 2016".to_string(), "7000.1".to_string())]
        );
        assert!(builder
            .build_payload(SourceFormat::LiteralTupleListText, "Jan 5")
            .is_err());
    }
}
