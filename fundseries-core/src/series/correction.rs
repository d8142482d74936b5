//! Known-bad entries to drop from a series.
//!
//! A correction names either a canonical date or a raw date token exactly as
//! the source spells it (for tokens that never normalize). Corrections are
//! data: they live in the instrument catalog, not in code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::CanonicalDate;

/// One entry to exclude.
///
/// In TOML: `{ date = "Jan 26, 2016" }` or `{ raw = " 26, 2016" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    /// Drop whatever the source published for this date.
    Date(CanonicalDate),
    /// Drop records whose raw date token equals this one (ignoring
    /// surrounding whitespace).
    Raw(String),
}

/// The corrections declared for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionSet {
    dates: BTreeSet<CanonicalDate>,
    raw: BTreeSet<String>,
}

impl CorrectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, correction: Correction) {
        match correction {
            Correction::Date(date) => {
                self.dates.insert(date);
            }
            Correction::Raw(token) => {
                self.raw.insert(token.trim().to_string());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len() + self.raw.len()
    }

    /// Does a raw date token, as decoded, name a dropped entry?
    pub fn matches_raw(&self, token: &str) -> bool {
        self.raw.contains(token.trim())
    }

    pub fn matches_date(&self, date: &CanonicalDate) -> bool {
        self.dates.contains(date)
    }

    /// Does a key of a persisted series file name a dropped entry?
    ///
    /// Persisted keys are canonical dates, but files written by older tools
    /// may still hold raw keys, so both forms are checked.
    pub fn matches_key(&self, key: &str) -> bool {
        self.matches_raw(key)
            || key
                .parse::<CanonicalDate>()
                .is_ok_and(|date| self.matches_date(&date))
    }
}

impl FromIterator<Correction> for CorrectionSet {
    fn from_iter<I: IntoIterator<Item = Correction>>(iter: I) -> Self {
        let mut set = CorrectionSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Correction> for CorrectionSet {
    fn extend<I: IntoIterator<Item = Correction>>(&mut self, iter: I) {
        for correction in iter {
            self.insert(correction);
        }
    }
}
