//! Instrument catalog: the curated allow-list of what a run processes.
//!
//! Stored as TOML, one `[[instrument]]` table per entry. Each entry names the
//! payload shape, where the payload comes from, optional overrides of the
//! shape's date grammar and unit suffix, and the corrections to apply.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use fundseries_core::{
    Category, Correction, CorrectionSet, DateFormat, RecordFormat, SourceFormat, UnitSuffix,
};

use crate::config::ConfigError;
use crate::sink::sanitize_file_stem;

const BUILTIN_CATALOG: &str = include_str!("../catalog/default.toml");

/// Where an instrument's payload comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    /// A file under the raw directory; defaults to `<name>.txt`.
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
    /// The UITF daily NAVPU endpoint.
    Uitf { bank_id: String, fund_id: String },
}

impl Default for SourceSpec {
    fn default() -> Self {
        SourceSpec::File { file: None }
    }
}

impl SourceSpec {
    pub fn needs_network(&self) -> bool {
        matches!(self, SourceSpec::Uitf { .. })
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub name: String,
    pub category: Category,
    pub format: SourceFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_suffix: Option<UnitSuffix>,
    #[serde(default)]
    pub source: SourceSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,
}

impl InstrumentSpec {
    pub fn new(name: impl Into<String>, category: Category, format: SourceFormat) -> Self {
        Self {
            name: name.into(),
            category,
            format,
            date_format: None,
            unit_suffix: None,
            source: SourceSpec::default(),
            corrections: Vec::new(),
        }
    }

    /// Date grammar and unit suffix, with per-instrument overrides applied.
    pub fn record_format(&self) -> RecordFormat {
        RecordFormat {
            date: self
                .date_format
                .unwrap_or_else(|| self.format.default_date_format()),
            unit_suffix: self
                .unit_suffix
                .clone()
                .or_else(|| self.format.default_unit_suffix()),
        }
    }

    pub fn correction_set(&self) -> CorrectionSet {
        self.corrections.iter().cloned().collect()
    }

    /// File name (without extension) of the persisted series.
    pub fn file_stem(&self) -> String {
        sanitize_file_stem(&self.name)
    }

    /// Raw file name for file-sourced instruments.
    pub fn raw_file_name(&self) -> Option<String> {
        match &self.source {
            SourceSpec::File { file: Some(file) } => Some(file.clone()),
            SourceSpec::File { file: None } => Some(format!("{}.txt", self.name)),
            SourceSpec::Uitf { .. } => None,
        }
    }
}

impl fmt::Display for InstrumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

/// The full allow-list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "instrument", default)]
    pub instruments: Vec<InstrumentSpec>,
}

impl Catalog {
    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a catalog from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&InstrumentSpec> {
        self.instruments.iter().find(|i| i.name == name)
    }

    pub fn by_category(&self, category: Category) -> Vec<&InstrumentSpec> {
        self.instruments
            .iter()
            .filter(|i| i.category == category)
            .collect()
    }

    /// Names must be non-empty and unique, and must not collide once
    /// sanitized into file names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names: HashMap<&str, usize> = HashMap::new();
        let mut stems: HashMap<String, &str> = HashMap::new();

        for (i, spec) in self.instruments.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "instrument #{} has an empty name",
                    i + 1
                )));
            }
            if let Some(first) = names.insert(spec.name.as_str(), i) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate instrument name '{}' (entries #{} and #{})",
                    spec.name,
                    first + 1,
                    i + 1
                )));
            }
            if let Some(other) = stems.insert(spec.file_stem(), spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "instruments '{other}' and '{}' would write the same file '{}.json'",
                    spec.name,
                    spec.file_stem()
                )));
            }
        }
        Ok(())
    }

    /// Instruments to process: all of them, or the named subset in catalog order.
    pub fn select(&self, only: &[String]) -> Result<Vec<&InstrumentSpec>, ConfigError> {
        if only.is_empty() {
            return Ok(self.instruments.iter().collect());
        }
        if let Some(unknown) = only.iter().find(|name| self.get(name).is_none()) {
            return Err(ConfigError::Invalid(format!(
                "'{unknown}' is not in the catalog"
            )));
        }
        Ok(self
            .instruments
            .iter()
            .filter(|spec| only.contains(&spec.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundseries_core::CanonicalDate;

    #[test]
    fn builtin_catalog_reproduces_the_allow_list() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 17);
        assert_eq!(catalog.by_category(Category::Uitf).len(), 10);
        assert_eq!(catalog.by_category(Category::MutualFund).len(), 4);
        assert_eq!(catalog.by_category(Category::Etf).len(), 1);
        assert_eq!(catalog.by_category(Category::Index).len(), 2);

        let pnb = catalog.get("PNB Phil-Index Tracker Fund").unwrap();
        assert_eq!(pnb.corrections, vec![Correction::Raw(" 26, 2016".into())]);

        let pami = catalog.get("PAMI Equity Index Fund").unwrap();
        assert_eq!(pami.record_format().unit_suffix, Some(UnitSuffix::Chars(1)));

        let tri = catalog.get("PSEi Total Return").unwrap();
        assert_eq!(tri.record_format().date, DateFormat::UsSlash);
        assert_eq!(tri.raw_file_name().as_deref(), Some("PSEi Total Return.txt"));
    }

    #[test]
    fn overrides_and_sources_parse() {
        let catalog = Catalog::from_toml(
            r#"
[[instrument]]
name = "Live Fund"
category = "uitf"
format = "labeled_json_blob"
source = { kind = "uitf", bank_id = "12", fund_id = "34" }
corrections = [{ date = "Jan 26, 2016" }]

[[instrument]]
name = "Odd Export"
category = "mutual_fund"
format = "tab_separated"
date_format = "iso_ymd"
unit_suffix = { literal = "PHP" }
source = { kind = "file", file = "odd.tsv" }
"#,
        )
        .unwrap();

        let live = catalog.get("Live Fund").unwrap();
        assert!(live.source.needs_network());
        assert_eq!(live.raw_file_name(), None);
        assert!(live
            .correction_set()
            .matches_date(&CanonicalDate::from_ymd(2016, 1, 26).unwrap()));

        let odd = catalog.get("Odd Export").unwrap();
        assert_eq!(
            odd.record_format(),
            RecordFormat::new(DateFormat::IsoYmd)
                .with_unit_suffix(UnitSuffix::Literal("PHP".into()))
        );
        assert_eq!(odd.raw_file_name().as_deref(), Some("odd.tsv"));
    }

    #[test]
    fn duplicate_names_and_stems_are_rejected() {
        let dup = r#"
[[instrument]]
name = "A"
category = "index"
format = "tab_separated"

[[instrument]]
name = "A"
category = "index"
format = "tab_separated"
"#;
        assert!(matches!(Catalog::from_toml(dup), Err(ConfigError::Invalid(_))));

        let collide = r#"
[[instrument]]
name = "A/B"
category = "index"
format = "tab_separated"

[[instrument]]
name = "A:B"
category = "index"
format = "tab_separated"
"#;
        let err = Catalog::from_toml(collide).unwrap_err();
        assert!(err.to_string().contains("A_B.json"), "{err}");
    }

    #[test]
    fn unknown_format_tag_is_a_parse_error() {
        let bad = "[[instrument]]\nname = \"A\"\ncategory = \"index\"\nformat = \"xml\"\n";
        assert!(matches!(Catalog::from_toml(bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn select_keeps_catalog_order() {
        let catalog = Catalog::builtin().unwrap();
        let picked = catalog
            .select(&["PSEi".to_string(), "PAMI Equity Index Fund".to_string()])
            .unwrap();
        let names: Vec<&str> = picked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["PAMI Equity Index Fund", "PSEi"]);

        assert_eq!(catalog.select(&[]).unwrap().len(), 17);
        assert!(catalog.select(&["Nope".to_string()]).is_err());
    }
}
