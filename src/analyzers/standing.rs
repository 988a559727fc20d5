use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::record::StudentRecord;

/// Thresholds that turn scores into outcomes.
///
/// Score bands are expressed on a 0–100 scale and applied to
/// `overall / score_max * 100`, so the same policy serves datasets scored out
/// of 100 or 1000.
///
/// | Standing   | Rule                                                     |
/// |------------|----------------------------------------------------------|
/// | Completed  | outcome predicate holds (see [`OutcomePolicy::completed`]) |
/// | Dropout    | not completed and band < `dropout_score`                 |
/// | Active     | everything else                                          |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomePolicy {
    pub completion_score: f64,
    pub dropout_score: f64,
    /// Engagement `CompletionRate` column value at or above which a student counts as completed.
    pub completion_rate_threshold: f64,
    pub score_max: f64,
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self {
            completion_score: 60.0,
            dropout_score: 40.0,
            completion_rate_threshold: 90.0,
            score_max: 100.0,
        }
    }
}

impl OutcomePolicy {
    /// `score_max` must be finite and positive, every threshold finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.score_max.is_finite() && self.score_max > 0.0) {
            return Err(DashboardError::Config(format!(
                "score_max must be a positive number, got {}",
                self.score_max
            )));
        }
        let thresholds = [
            ("completion_score", self.completion_score),
            ("dropout_score", self.dropout_score),
            ("completion_rate_threshold", self.completion_rate_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(DashboardError::Config(format!("{name} must be a number, got {value}")));
            }
        }
        Ok(())
    }

    /// Overall score mapped onto 0–100.
    pub fn band(&self, record: &StudentRecord) -> f64 {
        if self.score_max <= 0.0 {
            return 0.0;
        }
        record.overall_score() / self.score_max * 100.0
    }

    /// Engagement records carry an explicit flag; demographic records pass on score.
    pub fn completed(&self, record: &StudentRecord) -> bool {
        match record {
            StudentRecord::Engagement(r) => r.completed,
            StudentRecord::Demographic(_) => self.band(record) >= self.completion_score,
        }
    }

    pub fn classify(&self, record: &StudentRecord) -> Standing {
        match self.band(record) {
            _ if self.completed(record) => Standing::Completed,
            b if b < self.dropout_score => Standing::Dropout,
            _ => Standing::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Standing {
    Completed,
    Active,
    Dropout,
}

impl Standing {
    pub const ALL: [Standing; 3] = [Standing::Completed, Standing::Active, Standing::Dropout];

    pub fn label(self) -> &'static str {
        match self {
            Standing::Completed => "Completed",
            Standing::Active => "Active",
            Standing::Dropout => "Dropped Out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{demographic, engagement};

    #[test]
    fn test_validate_score_max() {
        assert!(OutcomePolicy::default().validate().is_ok());
        for score_max in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let policy = OutcomePolicy { score_max, ..OutcomePolicy::default() };
            assert!(matches!(policy.validate(), Err(DashboardError::Config(_))));
        }
        let policy = OutcomePolicy { dropout_score: f64::NAN, ..OutcomePolicy::default() };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_demographic_band_boundaries() {
        let policy = OutcomePolicy::default();
        let at = |s: f64| policy.classify(&demographic(1, "none", "x", [s, s, s]));

        assert_eq!(at(100.0), Standing::Completed);
        assert_eq!(at(60.0), Standing::Completed);
        assert_eq!(at(59.9), Standing::Active);
        assert_eq!(at(40.0), Standing::Active);
        assert_eq!(at(39.9), Standing::Dropout);
        assert_eq!(at(0.0), Standing::Dropout);
    }

    #[test]
    fn test_engagement_uses_completed_flag() {
        let policy = OutcomePolicy::default();
        assert_eq!(
            policy.classify(&engagement("a", "c", 1.0, &[10.0], true)),
            Standing::Completed
        );
        assert_eq!(
            policy.classify(&engagement("b", "c", 1.0, &[95.0], false)),
            Standing::Active
        );
        assert_eq!(
            policy.classify(&engagement("c", "c", 1.0, &[20.0], false)),
            Standing::Dropout
        );
    }

    #[test]
    fn test_score_scale_of_thousand() {
        let policy = OutcomePolicy {
            score_max: 1000.0,
            ..Default::default()
        };
        let r = demographic(1, "none", "x", [600.0, 600.0, 600.0]);
        assert_eq!(policy.band(&r), 60.0);
        assert_eq!(policy.classify(&r), Standing::Completed);
    }
}
