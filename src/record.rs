//! Student record shapes produced by ingestion and consumed by the analyzers.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analyzers::utility::mean;

/// Which column layout an input uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// gender / ethnicity / parental education / lunch / test prep plus three subject scores.
    Demographic,
    /// Online course engagement: hours watched, quiz score and completion rate.
    #[default]
    Engagement,
}

/// One row of the demographic dataset. Identity is the 1-based data-row position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicRecord {
    #[serde(default)]
    pub row: usize,
    pub gender: String,
    #[serde(alias = "race_ethnicity", alias = "race/ethnicity")]
    pub ethnicity: String,
    #[serde(alias = "parental_level_of_education")]
    pub parent_education: String,
    #[serde(alias = "lunch")]
    pub lunch_type: String,
    #[serde(alias = "test_preparation_course")]
    pub test_prep_course: String,
    pub math_score: f64,
    pub reading_score: f64,
    pub writing_score: f64,
}

/// Accepts `value` when it is finite and within `[0, max]`.
pub fn check_score(value: f64, column: &str, max: f64) -> std::result::Result<f64, String> {
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{column} out of range [0, {max}]: {value}"))
    }
}

impl DemographicRecord {
    pub fn overall_score(&self) -> f64 {
        (self.math_score + self.reading_score + self.writing_score) / 3.0
    }

    /// Every subject score must be finite and within `[0, score_max]`.
    pub fn validate(&self, score_max: f64) -> std::result::Result<(), String> {
        check_score(self.math_score, "math_score", score_max)?;
        check_score(self.reading_score, "reading_score", score_max)?;
        check_score(self.writing_score, "writing_score", score_max)?;
        Ok(())
    }
}

/// One row of the online-engagement dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementRecord {
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub hours_watched: f64,
    pub quiz_scores: Vec<f64>,
    pub completed: bool,
    pub dropout_week: Option<u32>,
}

impl EngagementRecord {
    /// Mean of the quiz scores; 0.0 when the student has none.
    pub fn overall_score(&self) -> f64 {
        mean(&self.quiz_scores)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StudentRecord {
    Demographic(DemographicRecord),
    Engagement(EngagementRecord),
}

impl StudentRecord {
    pub fn id(&self) -> String {
        match self {
            StudentRecord::Demographic(r) => r.row.to_string(),
            StudentRecord::Engagement(r) => r.student_id.clone(),
        }
    }

    pub fn overall_score(&self) -> f64 {
        match self {
            StudentRecord::Demographic(r) => r.overall_score(),
            StudentRecord::Engagement(r) => r.overall_score(),
        }
    }

    pub fn hours_watched(&self) -> Option<f64> {
        match self {
            StudentRecord::Demographic(_) => None,
            StudentRecord::Engagement(r) => Some(r.hours_watched),
        }
    }

    pub fn as_demographic(&self) -> Option<&DemographicRecord> {
        match self {
            StudentRecord::Demographic(r) => Some(r),
            StudentRecord::Engagement(_) => None,
        }
    }

    pub fn as_engagement(&self) -> Option<&EngagementRecord> {
        match self {
            StudentRecord::Demographic(_) => None,
            StudentRecord::Engagement(r) => Some(r),
        }
    }

    /// Free-text fields a user can search on.
    pub fn text_fields(&self) -> Vec<&str> {
        match self {
            StudentRecord::Demographic(r) => vec![
                &r.gender,
                &r.ethnicity,
                &r.parent_education,
                &r.lunch_type,
                &r.test_prep_course,
            ],
            StudentRecord::Engagement(r) => vec![&r.student_id, &r.name, &r.course],
        }
    }
}

impl From<DemographicRecord> for StudentRecord {
    fn from(r: DemographicRecord) -> Self {
        StudentRecord::Demographic(r)
    }
}

impl From<EngagementRecord> for StudentRecord {
    fn from(r: EngagementRecord) -> Self {
        StudentRecord::Engagement(r)
    }
}
