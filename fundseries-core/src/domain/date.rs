//! Canonical calendar dates and the source date grammars that feed them.
//!
//! Every decoder funnels its raw date tokens through [`DateNormalizer::parse`],
//! which knows one grammar per [`DateFormat`]. The result is a
//! [`CanonicalDate`] that always renders as `"Mon D, YYYY"` (unpadded day).

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Earliest year accepted by the sanity band.
pub const MIN_YEAR: i32 = 1900;
/// Latest year accepted by the sanity band.
pub const MAX_YEAR: i32 = 2100;

const DISPLAY_RENDER: &str = "%b %-d, %Y";
const DISPLAY_PARSE: &str = "%b %d, %Y";
const ISO_PARSE: &str = "%Y-%m-%d";
const US_SLASH_PARSE: &str = "%m/%d/%Y";

/// Source-side date grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    IsoYmd,
    /// `MM/DD/YYYY`
    UsSlash,
    /// Integer milliseconds since the Unix epoch (UTC).
    EpochMillis,
    /// `Mon D, YYYY`, already in display form; only revalidated.
    DisplayAlreadyCanonical,
}

impl DateFormat {
    pub const ALL: [DateFormat; 4] = [
        DateFormat::IsoYmd,
        DateFormat::UsSlash,
        DateFormat::EpochMillis,
        DateFormat::DisplayAlreadyCanonical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::IsoYmd => "iso_ymd",
            DateFormat::UsSlash => "us_slash",
            DateFormat::EpochMillis => "epoch_millis",
            DateFormat::DisplayAlreadyCanonical => "display_already_canonical",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = DateFormat::ALL.iter().map(|f| f.as_str()).collect();
                format!("unknown date format '{s}'. Valid: {}", valid.join(", "))
            })
    }
}

/// A date token that could not be turned into a [`CanonicalDate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDate {
    #[error("'{token}' does not match the {format} date grammar")]
    Grammar { token: String, format: DateFormat },

    #[error("'{token}' has year {year}, outside {MIN_YEAR}..={MAX_YEAR}")]
    YearOutOfRange { token: String, year: i32 },
}

impl MalformedDate {
    /// The offending token, as seen after whitespace trimming.
    pub fn token(&self) -> &str {
        match self {
            MalformedDate::Grammar { token, .. } | MalformedDate::YearOutOfRange { token, .. } => {
                token
            }
        }
    }
}

/// Calendar date with no time component, restricted to the sanity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn new(date: NaiveDate) -> Result<Self, MalformedDate> {
        check_year_band(date, &date.to_string())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, MalformedDate> {
        let token = format!("{year:04}-{month:02}-{day:02}");
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(MalformedDate::Grammar {
            token: token.clone(),
            format: DateFormat::IsoYmd,
        })?;
        check_year_band(date, &token)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `"Mon D, YYYY"`, e.g. `"Jan 5, 2016"`.
    pub fn render(&self) -> String {
        self.0.format(DISPLAY_RENDER).to_string()
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DISPLAY_RENDER))
    }
}

impl FromStr for CanonicalDate {
    type Err = MalformedDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateNormalizer::parse(s, DateFormat::DisplayAlreadyCanonical)
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses raw date tokens by declared grammar.
pub struct DateNormalizer;

impl DateNormalizer {
    /// Parse `raw` according to `format`. Surrounding whitespace is ignored.
    pub fn parse(raw: &str, format: DateFormat) -> Result<CanonicalDate, MalformedDate> {
        let token = raw.trim();
        let parsed = match format {
            DateFormat::IsoYmd => NaiveDate::parse_from_str(token, ISO_PARSE).ok(),
            DateFormat::UsSlash => NaiveDate::parse_from_str(token, US_SLASH_PARSE).ok(),
            DateFormat::DisplayAlreadyCanonical => {
                NaiveDate::parse_from_str(token, DISPLAY_PARSE).ok()
            }
            DateFormat::EpochMillis => token.parse::<i64>().ok().and_then(|millis| {
                // Sub-second remainder is dropped, flooring toward the past.
                let secs = millis.div_euclid(1000);
                DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc().date())
            }),
        };

        let date = parsed.ok_or_else(|| MalformedDate::Grammar {
            token: token.to_string(),
            format,
        })?;
        check_year_band(date, token)
    }

    /// Render a date in canonical display form.
    pub fn render(date: &CanonicalDate) -> String {
        date.render()
    }
}

fn check_year_band(date: NaiveDate, token: &str) -> Result<CanonicalDate, MalformedDate> {
    let year = date.year();
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(CanonicalDate(date))
    } else {
        Err(MalformedDate::YearOutOfRange {
            token: token.to_string(),
            year,
        })
    }
}
