use serde::{Deserialize, Serialize};
use std::fmt;

use crate::series::Series;

/// Instrument family. Persistence policy (overwrite or not) is set per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Unit investment trust fund.
    Uitf,
    MutualFund,
    /// Exchange-traded fund.
    Etf,
    /// Market index used as a benchmark.
    Index,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Uitf => "uitf",
            Category::MutualFund => "mutual_fund",
            Category::Etf => "etf",
            Category::Index => "index",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named instrument and the series rebuilt for it this run.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub category: Category,
    pub series: Series,
}

impl Instrument {
    pub fn new(name: impl Into<String>, category: Category, series: Series) -> Self {
        Self {
            name: name.into(),
            category,
            series,
        }
    }
}
