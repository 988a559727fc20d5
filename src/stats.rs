use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::standing::{OutcomePolicy, Standing};
use crate::analyzers::utility::{mean, pct, round1};
use crate::record::StudentRecord;

/// Headline numbers for a record set.
///
/// Deserializes from the backend's `stats` object, which omits the
/// dropout/active fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_students: usize,
    /// Percent, one decimal.
    pub completion_rate: f64,
    pub average_score: f64,
    /// Percent, one decimal.
    #[serde(default)]
    pub dropout_rate: f64,
    #[serde(default)]
    pub active_students: usize,
}

impl AggregateStats {
    pub fn from_records(records: &[StudentRecord], policy: &OutcomePolicy) -> Self {
        let mut completed = 0;
        let mut dropouts = 0;
        let mut active = 0;

        for record in records {
            match policy.classify(record) {
                Standing::Completed => completed += 1,
                Standing::Dropout => dropouts += 1,
                Standing::Active => active += 1,
            }
        }

        let scores: Vec<f64> = records.iter().map(StudentRecord::overall_score).collect();

        AggregateStats {
            total_students: records.len(),
            completion_rate: round1(pct(completed, records.len())),
            average_score: mean(&scores),
            dropout_rate: round1(pct(dropouts, records.len())),
            active_students: active,
        }
    }
}

/// One line of the stats history CSV.
#[derive(Debug, Serialize)]
pub struct StatsRow {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub total_students: usize,
    pub completion_rate: f64,
    pub average_score: f64,
    pub dropout_rate: f64,
    pub active_students: usize,
}

impl StatsRow {
    pub fn new(source: &str, stats: &AggregateStats) -> Self {
        StatsRow {
            timestamp: Utc::now(),
            source: source.to_string(),
            total_students: stats.total_students,
            completion_rate: stats.completion_rate,
            average_score: stats.average_score,
            dropout_rate: stats.dropout_rate,
            active_students: stats.active_students,
        }
    }
}
