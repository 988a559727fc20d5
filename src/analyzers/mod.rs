//! Pure aggregation over student records.
//!
//! Everything here takes an immutable slice of records and returns fresh
//! chart-ready values: summary stats, score bins, per-category averages and
//! scatter projections.

pub mod aggregate;
pub mod bins;
pub mod group;
pub mod standing;
pub mod utility;

pub use aggregate::{compute_summary_stats, standing_breakdown};
pub use bins::{Bin, BinCount, BinSpec, bin_by_score};
pub use group::{
    CorrelationPoint, GroupAverage, correlate, correlate_by, group_by_category, rate_by_category,
    subject_averages, test_prep_label,
};
pub use standing::{OutcomePolicy, Standing};
