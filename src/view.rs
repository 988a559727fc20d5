//! Typed view model for dashboard pages.
//!
//! A page is a fixed list of [`ChartId`]s; building a view computes each
//! chart's series from the current records.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Display;

use crate::analyzers::bins::{BinCount, BinSpec, bin_by_score};
use crate::analyzers::group::{
    self, CorrelationPoint, GroupAverage, correlate, group_by_category, rate_by_category,
    subject_averages, test_prep_label,
};
use crate::analyzers::standing::{OutcomePolicy, Standing};
use crate::analyzers::{compute_summary_stats, standing_breakdown};
use crate::record::StudentRecord;
use crate::stats::AggregateStats;

/// Shown in place of values a record does not have.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn or_not_available<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Text field with blanks shown as [`NOT_AVAILABLE`].
pub fn text_or_not_available(value: &str) -> &str {
    if value.trim().is_empty() { NOT_AVAILABLE } else { value }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Overview,
    Scores,
    Dropouts,
    Trends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    CompletionSplit,
    ScoreDistribution,
    TestPrepPerformance,
    EngagementCorrelation,
    SubjectAverages,
    DropoutByEducation,
    DropoutByGender,
    DropoutByCourse,
    CompletionByEducation,
}

impl Page {
    pub fn charts(self) -> &'static [ChartId] {
        match self {
            Page::Overview => &[
                ChartId::CompletionSplit,
                ChartId::ScoreDistribution,
                ChartId::TestPrepPerformance,
                ChartId::EngagementCorrelation,
            ],
            Page::Scores => &[
                ChartId::ScoreDistribution,
                ChartId::TestPrepPerformance,
                ChartId::SubjectAverages,
            ],
            Page::Dropouts => &[
                ChartId::DropoutByEducation,
                ChartId::DropoutByGender,
                ChartId::DropoutByCourse,
            ],
            Page::Trends => &[ChartId::CompletionByEducation, ChartId::SubjectAverages],
        }
    }
}

impl ChartId {
    pub fn title(self) -> &'static str {
        match self {
            ChartId::CompletionSplit => "Completion Status",
            ChartId::ScoreDistribution => "Score Distribution",
            ChartId::TestPrepPerformance => "Average Score by Test Preparation",
            ChartId::EngagementCorrelation => "Engagement Correlation",
            ChartId::SubjectAverages => "Average Scores by Subject",
            ChartId::DropoutByEducation => "Dropout Rate (%) by Parental Education",
            ChartId::DropoutByGender => "Dropout Rate (%) by Gender",
            ChartId::DropoutByCourse => "Dropout Rate (%) by Course",
            ChartId::CompletionByEducation => "Completion Rate (%) by Parental Education",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Series {
    Counts(Vec<BinCount>),
    Averages(Vec<GroupAverage>),
    Points(Vec<CorrelationPoint>),
}

impl Series {
    pub fn is_empty(&self) -> bool {
        match self {
            Series::Counts(v) => v.is_empty(),
            Series::Averages(v) => v.is_empty(),
            Series::Points(v) => v.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: ChartId,
    pub title: &'static str,
    pub series: Series,
}

pub fn build_chart(
    id: ChartId,
    records: &[StudentRecord],
    policy: &OutcomePolicy,
    bins: &BinSpec,
) -> Chart {
    let is_dropout = |r: &StudentRecord| policy.classify(r) == Standing::Dropout;

    let series = match id {
        ChartId::CompletionSplit => Series::Counts(standing_breakdown(records, policy)),
        ChartId::ScoreDistribution => Series::Counts(bin_by_score(records, bins)),
        ChartId::TestPrepPerformance => Series::Averages(group_by_category(
            records,
            test_prep_label,
            StudentRecord::overall_score,
        )),
        ChartId::EngagementCorrelation => Series::Points(correlate(records)),
        ChartId::SubjectAverages => Series::Averages(subject_averages(records)),
        ChartId::DropoutByEducation => {
            Series::Averages(rate_by_category(records, group::parent_education, is_dropout))
        }
        ChartId::DropoutByGender => {
            Series::Averages(rate_by_category(records, group::gender, is_dropout))
        }
        ChartId::DropoutByCourse => {
            Series::Averages(rate_by_category(records, group::course, is_dropout))
        }
        ChartId::CompletionByEducation => Series::Averages(rate_by_category(
            records,
            group::parent_education,
            |r| policy.completed(r),
        )),
    };

    Chart {
        id,
        title: id.title(),
        series,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub page: Page,
    pub generated_at: DateTime<Utc>,
    pub stats: AggregateStats,
    pub charts: Vec<Chart>,
}

impl DashboardView {
    pub fn build(
        page: Page,
        records: &[StudentRecord],
        policy: &OutcomePolicy,
        bins: &BinSpec,
    ) -> Self {
        DashboardView {
            page,
            generated_at: Utc::now(),
            stats: compute_summary_stats(records, policy),
            charts: page
                .charts()
                .iter()
                .map(|id| build_chart(*id, records, policy, bins))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{demographic, engagement};

    fn build(page: Page, records: &[StudentRecord]) -> DashboardView {
        DashboardView::build(
            page,
            records,
            &OutcomePolicy::default(),
            &BinSpec::grade_bands(100.0),
        )
    }

    #[test]
    fn test_overview_chart_order() {
        let view = build(Page::Overview, &[]);
        let ids: Vec<_> = view.charts.iter().map(|c| c.id).collect();
        assert_eq!(ids, Page::Overview.charts());
        assert_eq!(view.stats, AggregateStats::default());
    }

    #[test]
    fn test_dropout_rates_by_education() {
        let records = vec![
            demographic(1, "none", "college", [20.0, 20.0, 20.0]),
            demographic(2, "none", "college", [80.0, 80.0, 80.0]),
        ];
        let view = build(Page::Dropouts, &records);
        assert_eq!(
            view.charts[0].series,
            Series::Averages(vec![GroupAverage {
                label: "college".into(),
                average_value: 50.0
            }])
        );
        // no engagement records, so no course breakdown
        assert!(view.charts[2].series.is_empty());
    }

    #[test]
    fn test_engagement_overview_series() {
        let records = vec![
            engagement("1", "Math", 5.0, &[95.0], true),
            engagement("2", "Math", 1.0, &[30.0], false),
        ];
        let view = build(Page::Overview, &records);
        assert_eq!(
            view.charts[0].series,
            Series::Counts(vec![
                BinCount { label: "Completed".into(), count: 1 },
                BinCount { label: "Active".into(), count: 0 },
                BinCount { label: "Dropped Out".into(), count: 1 },
            ])
        );
        assert!(view.charts[2].series.is_empty());
        assert!(matches!(&view.charts[3].series, Series::Points(p) if p.len() == 2));
    }

    #[test]
    fn test_series_json_is_tagged() {
        let chart = build_chart(
            ChartId::SubjectAverages,
            &[],
            &OutcomePolicy::default(),
            &BinSpec::grade_bands(100.0),
        );
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["id"], "subject_averages");
        assert_eq!(json["series"]["kind"], "averages");
    }

    #[test]
    fn test_not_available_sentinel() {
        assert_eq!(or_not_available(None::<u32>), "N/A");
        assert_eq!(or_not_available(Some(3)), "3");
        assert_eq!(text_or_not_available(" "), "N/A");
        assert_eq!(text_or_not_available("none"), "none");
    }
}
