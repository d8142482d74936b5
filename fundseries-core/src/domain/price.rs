//! Canonical decimal prices.
//!
//! Prices are kept as validated decimal strings (`^\d+(\.\d+)?$`) so that the
//! digits a source published survive any number of re-serializations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Trailing unit marker a source appends to its prices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSuffix {
    /// A marker of fixed character length. Only stripped when none of those
    /// characters is a digit, so an unmarked value is never truncated.
    /// `Chars(0)` disables stripping.
    Chars(usize),
    /// A literal marker, stripped when present.
    Literal(String),
}

impl UnitSuffix {
    /// Remove the marker from the end of `token`, if present.
    pub fn strip<'a>(&self, token: &'a str) -> &'a str {
        match self {
            UnitSuffix::Chars(0) => token,
            UnitSuffix::Chars(n) => match token.char_indices().rev().nth(n - 1) {
                Some((cut, _)) if !token[cut..].chars().any(|c| c.is_ascii_digit()) => {
                    token[..cut].trim_end()
                }
                _ => token,
            },
            UnitSuffix::Literal(marker) => token
                .strip_suffix(marker.as_str())
                .map_or(token, str::trim_end),
        }
    }
}

/// A price token that is not a non-negative decimal numeral.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPrice {
    #[error("empty price")]
    Empty,

    #[error("'{token}' is negative")]
    Negative { token: String },

    #[error("'{token}' is not a decimal numeral")]
    NotDecimal { token: String },
}

impl MalformedPrice {
    pub fn token(&self) -> &str {
        match self {
            MalformedPrice::Empty => "",
            MalformedPrice::Negative { token } | MalformedPrice::NotDecimal { token } => token,
        }
    }
}

/// Non-negative decimal quantity held as its decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPrice(String);

impl CanonicalPrice {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CanonicalPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CanonicalPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PriceNormalizer::parse_text(&raw, None).map_err(serde::de::Error::custom)
    }
}

/// Extracts canonical prices from textual or numeric source values.
pub struct PriceNormalizer;

impl PriceNormalizer {
    /// Parse a textual price, stripping `unit_suffix` first when declared.
    pub fn parse_text(
        raw: &str,
        unit_suffix: Option<&UnitSuffix>,
    ) -> Result<CanonicalPrice, MalformedPrice> {
        let token = raw.trim();
        let token = match unit_suffix {
            Some(suffix) => suffix.strip(token),
            None => token,
        };
        validate(token)
    }

    /// Render a numeric price without exponent or forced trailing zeros.
    pub fn parse_number(value: f64) -> Result<CanonicalPrice, MalformedPrice> {
        if !value.is_finite() {
            return Err(MalformedPrice::NotDecimal {
                token: value.to_string(),
            });
        }
        if value < 0.0 {
            return Err(MalformedPrice::Negative {
                token: value.to_string(),
            });
        }
        // -0.0 would otherwise render with a sign.
        let rendered = if value == 0.0 {
            "0".to_string()
        } else {
            format!("{value}")
        };
        validate(&rendered)
    }
}

fn validate(token: &str) -> Result<CanonicalPrice, MalformedPrice> {
    if token.is_empty() {
        return Err(MalformedPrice::Empty);
    }
    if is_decimal_numeral(token) {
        return Ok(CanonicalPrice(token.to_string()));
    }
    match token.strip_prefix('-') {
        Some(rest) if is_decimal_numeral(rest) => Err(MalformedPrice::Negative {
            token: token.to_string(),
        }),
        _ => Err(MalformedPrice::NotDecimal {
            token: token.to_string(),
        }),
    }
}

fn is_decimal_numeral(s: &str) -> bool {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match s.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(s),
    }
}
