//! AI summary seam: payload shaping, prompt text and graceful fallbacks.

use serde::Serialize;
use tracing::warn;

use crate::analyzers::standing::OutcomePolicy;
use crate::error::Result;
use crate::record::StudentRecord;

/// Shown when no API key is configured.
pub const PLACEHOLDER: &str = "\
### AI insights are not configured
This panel summarizes the loaded student data with a generative AI model.

**To enable it:**
* Set `GEMINI_API_KEY` in the environment or in a `.env` file.
* Or set `\"summary\": \"backend\"` in the settings file to use the dashboard backend.
* Re-run the command; the charts and statistics above are unaffected.";

/// Reduced per-student view sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_watched: Option<f64>,
    pub average_score: f64,
    pub completed: bool,
}

pub fn build_payload(records: &[StudentRecord], policy: &OutcomePolicy) -> Vec<StudentSummary> {
    records
        .iter()
        .map(|r| StudentSummary {
            student_id: r.id(),
            hours_watched: r.hours_watched(),
            average_score: r.overall_score(),
            completed: policy.completed(r),
        })
        .collect()
}

/// Up to three students who have not completed, for the prediction section.
pub fn prediction_candidates(payload: &[StudentSummary]) -> Vec<&str> {
    payload
        .iter()
        .filter(|s| !s.completed)
        .take(3)
        .map(|s| s.student_id.as_str())
        .collect()
}

pub fn build_prompt(payload: &[StudentSummary]) -> Result<String> {
    let data = serde_json::to_string_pretty(payload)
        .map_err(|e| crate::error::DashboardError::UpstreamAi(e.to_string()))?;
    let candidates = prediction_candidates(payload).join(", ");

    Ok(format!(
        "You are an educational data analyst. Analyze the JSON summary of student learning data \
below and give an educator actionable insights.

Student data summary:
```json
{data}
```

Sections:
1. Overview: overall performance and engagement in a few sentences.
2. Trends: completion versus dropout, the relationship between hoursWatched and averageScore \
(when present), and patterns that flag at-risk students.
3. Recommendations: 3-5 specific, concise bullet points.
4. Predictions: for students {candidates}, rate completion likelihood (High, Medium, Low) with a \
one-line justification each.

Format the whole answer as Markdown, using ### headings for sections and * for bullet points."
    ))
}

/// Source of natural-language summaries for a record set.
#[async_trait::async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(&self, records: &[StudentRecord]) -> Result<String>;
}

/// Provider used when credentials are missing; always returns [`PLACEHOLDER`].
pub struct Unconfigured;

#[async_trait::async_trait]
impl SummaryProvider for Unconfigured {
    async fn summarize(&self, _records: &[StudentRecord]) -> Result<String> {
        Ok(PLACEHOLDER.to_string())
    }
}

/// Provider standing in for one that could not be built; every call fails
/// with the recorded reason.
pub struct Unavailable(pub String);

#[async_trait::async_trait]
impl SummaryProvider for Unavailable {
    async fn summarize(&self, _records: &[StudentRecord]) -> Result<String> {
        Err(crate::error::DashboardError::UpstreamAi(self.0.clone()))
    }
}

/// Asks `provider` for a summary and turns any failure into displayable markdown.
pub async fn summarize_or_message(provider: &dyn SummaryProvider, records: &[StudentRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    match provider.summarize(records).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "AI summary failed");
            format!("### AI Insights Error\nFailed to get insights: {e}")
        }
    }
}
