//! Trait and wire types for the dashboard backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::bins::BinCount;
use crate::analyzers::group::GroupAverage;
use crate::analyzers::standing::OutcomePolicy;
use crate::error::Result;
use crate::record::{DemographicRecord, StudentRecord};
use crate::stats::AggregateStats;

/// Optional inclusive date filter for `/dashboard-data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Query pairs in `start_date` / `end_date` order, omitting unset bounds.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

/// `GET /dashboard-data` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: AggregateStats,
    pub student_data: Vec<DemographicRecord>,
}

impl DashboardData {
    /// Records with row identities assigned by response position. Records
    /// with a score outside `[0, score_max]` are dropped whole, as in ingestion.
    pub fn into_records(self, policy: &OutcomePolicy) -> Vec<StudentRecord> {
        self.student_data
            .into_iter()
            .enumerate()
            .filter_map(|(i, mut r)| {
                r.row = i + 1;
                match r.validate(policy.score_max) {
                    Ok(()) => Some(StudentRecord::Demographic(r)),
                    Err(reason) => {
                        debug!(row = r.row, %reason, "Skipping invalid backend record");
                        None
                    }
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreCount {
    pub score: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestPrepAverage {
    pub test_preparation_course: String,
    pub average_score: f64,
}

/// `GET /scores-data` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresData {
    #[serde(default)]
    pub score_distribution: Vec<ScoreCount>,
    #[serde(default)]
    pub performance_by_test_prep: Vec<TestPrepAverage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EducationRate {
    pub parental_level_of_education: String,
    #[serde(alias = "completion_rate")]
    pub dropout_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenderRate {
    pub gender: String,
    pub dropout_rate: f64,
}

/// `GET /dropouts-data` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropoutsData {
    #[serde(default)]
    pub dropout_by_education: Vec<EducationRate>,
    #[serde(default)]
    pub dropout_by_gender: Vec<GenderRate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectAverage {
    pub subject: String,
    pub average_score: f64,
}

/// `GET /trends-data` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsData {
    #[serde(default)]
    pub completion_trend: Vec<EducationRate>,
    #[serde(default)]
    pub average_scores_by_subject: Vec<SubjectAverage>,
}

impl ScoresData {
    pub fn distribution(&self) -> Vec<BinCount> {
        self.score_distribution
            .iter()
            .map(|s| BinCount {
                label: s.score.to_string(),
                count: s.count,
            })
            .collect()
    }

    pub fn by_test_prep(&self) -> Vec<GroupAverage> {
        self.performance_by_test_prep
            .iter()
            .map(|p| GroupAverage {
                label: p.test_preparation_course.clone(),
                average_value: p.average_score,
            })
            .collect()
    }
}

impl DropoutsData {
    pub fn by_education(&self) -> Vec<GroupAverage> {
        education_series(&self.dropout_by_education)
    }

    pub fn by_gender(&self) -> Vec<GroupAverage> {
        self.dropout_by_gender
            .iter()
            .map(|g| GroupAverage {
                label: g.gender.clone(),
                average_value: g.dropout_rate,
            })
            .collect()
    }
}

impl TrendsData {
    pub fn completion_by_education(&self) -> Vec<GroupAverage> {
        education_series(&self.completion_trend)
    }

    pub fn by_subject(&self) -> Vec<GroupAverage> {
        self.average_scores_by_subject
            .iter()
            .map(|s| GroupAverage {
                label: s.subject.clone(),
                average_value: s.average_score,
            })
            .collect()
    }
}

fn education_series(rows: &[EducationRate]) -> Vec<GroupAverage> {
    rows.iter()
        .map(|r| GroupAverage {
            label: r.parental_level_of_education.clone(),
            average_value: r.dropout_rate,
        })
        .collect()
}

/// `POST /predict` body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionInput {
    pub hours_watched: f64,
    pub average_score: f64,
    pub activity_level: f64,
}

/// Abstraction over the analytics backend.
#[async_trait::async_trait]
pub trait DashboardApi {
    async fn dashboard_data(&self, range: DateRange) -> Result<DashboardData>;
    async fn trends_data(&self) -> Result<TrendsData>;
    async fn scores_data(&self) -> Result<ScoresData>;
    async fn dropouts_data(&self) -> Result<DropoutsData>;
    /// Completion likelihood in `[0, 1]`.
    async fn predict(&self, input: PredictionInput) -> Result<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_pairs() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 1, 5),
            end: None,
        };
        assert_eq!(range.query_pairs(), vec![("start_date", "2025-01-05".to_string())]);
        assert!(DateRange::default().query_pairs().is_empty());
    }

    #[test]
    fn test_dashboard_data_assigns_rows() {
        let json = r#"{
            "stats": {"totalStudents": 2, "completionRate": 50.0, "averageScore": 61.5},
            "studentData": [
                {"gender":"female","race/ethnicity":"group B","parental_level_of_education":"some college","lunch":"standard","test_preparation_course":"none","math_score":72,"reading_score":72,"writing_score":74},
                {"gender":"male","race/ethnicity":"group A","parental_level_of_education":"high school","lunch":"standard","test_preparation_course":"completed","math_score":40,"reading_score":50,"writing_score":61}
            ]
        }"#;
        let data: DashboardData = serde_json::from_str(json).unwrap();
        assert_eq!(data.stats.total_students, 2);
        let records = data.into_records(&OutcomePolicy::default());
        assert_eq!(records[0].id(), "1");
        assert_eq!(records[1].id(), "2");
    }

    #[test]
    fn test_dashboard_data_drops_out_of_range_scores() {
        let json = r#"{
            "stats": {"totalStudents": 3, "completionRate": 0.0, "averageScore": 0.0},
            "studentData": [
                {"gender":"female","race/ethnicity":"group B","parental_level_of_education":"some college","lunch":"standard","test_preparation_course":"none","math_score":900,"reading_score":-50,"writing_score":400},
                {"gender":"male","race/ethnicity":"group A","parental_level_of_education":"high school","lunch":"standard","test_preparation_course":"completed","math_score":40,"reading_score":50,"writing_score":60},
                {"gender":"male","race/ethnicity":"group C","parental_level_of_education":"high school","lunch":"standard","test_preparation_course":"none","math_score":101,"reading_score":50,"writing_score":60}
            ]
        }"#;
        let data: DashboardData = serde_json::from_str(json).unwrap();
        let records = data.into_records(&OutcomePolicy::default());

        assert_eq!(records.len(), 1);
        // identity keeps the response position of the surviving record
        assert_eq!(records[0].id(), "2");
        assert_eq!(records[0].overall_score(), 50.0);
    }

    #[test]
    fn test_series_conversions() {
        let dropouts: DropoutsData = serde_json::from_str(
            r#"{"dropoutByEducation":[{"parental_level_of_education":"high school","dropout_rate":12.5}],
                "dropoutByGender":[{"gender":"male","dropout_rate":4.0}]}"#,
        )
        .unwrap();
        assert_eq!(dropouts.by_education()[0].average_value, 12.5);
        assert_eq!(dropouts.by_gender()[0].label, "male");

        let trends: TrendsData = serde_json::from_str(
            r#"{"completionTrend":[{"parental_level_of_education":"college","completion_rate":80.0}]}"#,
        )
        .unwrap();
        assert_eq!(trends.completion_by_education()[0].average_value, 80.0);
        assert!(trends.by_subject().is_empty());
    }
}
