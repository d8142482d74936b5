//! Per-build accounting of what happened to each record.

use serde::{Deserialize, Serialize};

/// Default number of rejected records kept as samples.
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

/// One record that did not make it into the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// 1-based position in the payload.
    pub position: usize,
    /// The token that failed, after trimming.
    pub token: String,
    pub reason: String,
}

/// Counts for one build.
///
/// `total == accepted + corrected + rejected`. `overwritten` counts accepted
/// records that replaced an earlier entry for the same date, so the series
/// holds `accepted - overwritten` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub total: usize,
    pub accepted: usize,
    pub corrected: usize,
    pub overwritten: usize,
    pub rejected: usize,
    /// The first few rejections, in payload order.
    pub samples: Vec<RejectedRecord>,
}

impl RejectionReport {
    /// Fraction of records rejected; zero for an empty payload.
    pub fn reject_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.rejected as f64 / self.total as f64
        }
    }

    pub fn exceeds(&self, max_ratio: f64) -> bool {
        self.reject_ratio() > max_ratio
    }

    /// Samples joined for a single log line: `#3 'abc' (reason); ...`.
    pub fn sample_summary(&self) -> String {
        self.samples
            .iter()
            .map(|s| format!("#{} '{}' ({})", s.position, s.token, s.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_empty_build_is_zero() {
        let report = RejectionReport::default();
        assert_eq!(report.reject_ratio(), 0.0);
        assert!(!report.exceeds(0.0));
    }

    #[test]
    fn exceeds_is_strict() {
        let report = RejectionReport {
            total: 20,
            accepted: 19,
            rejected: 1,
            ..Default::default()
        };
        assert!((report.reject_ratio() - 0.05).abs() < 1e-12);
        assert!(!report.exceeds(0.05));
        assert!(report.exceeds(0.04));
    }

    #[test]
    fn sample_summary_lists_positions_and_tokens() {
        let report = RejectionReport {
            total: 2,
            rejected: 2,
            samples: vec![
                RejectedRecord {
                    position: 1,
                    token: "x".into(),
                    reason: "bad".into(),
                },
                RejectedRecord {
                    position: 4,
                    token: "".into(),
                    reason: "empty price".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(report.sample_summary(), "#1 'x' (bad); #4 '' (empty price)");
    }
}
