use tracing::debug;

use crate::analyzers::bins::BinCount;
use crate::analyzers::standing::{OutcomePolicy, Standing};
use crate::record::StudentRecord;
use crate::stats::AggregateStats;

/// Summary statistics for `records`. Safe on empty input; never mutates `records`.
pub fn compute_summary_stats(records: &[StudentRecord], policy: &OutcomePolicy) -> AggregateStats {
    let stats = AggregateStats::from_records(records, policy);
    debug!(
        total = stats.total_students,
        completion_rate = stats.completion_rate,
        average_score = stats.average_score,
        "Summary stats computed"
    );
    stats
}

/// Completed / Active / Dropped Out counts, always in that order.
pub fn standing_breakdown(records: &[StudentRecord], policy: &OutcomePolicy) -> Vec<BinCount> {
    Standing::ALL
        .iter()
        .map(|standing| BinCount {
            label: standing.label().to_string(),
            count: records
                .iter()
                .filter(|r| policy.classify(r) == *standing)
                .count(),
        })
        .collect()
}
