//! The canonical series and the builder that folds raw records into it.

pub mod builder;
pub mod correction;
pub mod report;

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

use crate::domain::{CanonicalDate, CanonicalPrice};

pub use builder::{BuildOutcome, RecordError, SeriesBuilder};
pub use correction::{Correction, CorrectionSet};
pub use report::{RejectedRecord, RejectionReport, DEFAULT_SAMPLE_LIMIT};

/// Date → price map for one instrument, iterated chronologically.
///
/// Serializes as a JSON object keyed by rendered dates (`"Jan 5, 2016"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(BTreeMap<CanonicalDate, CanonicalPrice>);

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, returning the price this one replaced.
    pub fn insert(&mut self, date: CanonicalDate, price: CanonicalPrice) -> Option<CanonicalPrice> {
        self.0.insert(date, price)
    }

    pub fn remove(&mut self, date: &CanonicalDate) -> Option<CanonicalPrice> {
        self.0.remove(date)
    }

    pub fn get(&self, date: &CanonicalDate) -> Option<&CanonicalPrice> {
        self.0.get(date)
    }

    pub fn contains(&self, date: &CanonicalDate) -> bool {
        self.0.contains_key(date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CanonicalDate, CanonicalPrice> {
        self.0.iter()
    }

    pub fn first_date(&self) -> Option<CanonicalDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<CanonicalDate> {
        self.0.keys().next_back().copied()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = (&'a CanonicalDate, &'a CanonicalPrice);
    type IntoIter = btree_map::Iter<'a, CanonicalDate, CanonicalPrice>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(CanonicalDate, CanonicalPrice)> for Series {
    fn from_iter<I: IntoIterator<Item = (CanonicalDate, CanonicalPrice)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
