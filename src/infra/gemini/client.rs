use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::standing::OutcomePolicy;
use crate::error::{DashboardError, Result};
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, json_request, send_json};
use crate::record::StudentRecord;
use crate::services::summary::{SummaryProvider, build_payload, build_prompt};

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Summaries from the Gemini `generateContent` REST endpoint.
pub struct GeminiClient<C = BasicClient> {
    base_url: String,
    model: String,
    policy: OutcomePolicy,
    http: ApiKey<C>,
}

impl GeminiClient<BasicClient> {
    pub fn new(base_url: &str, model: &str, api_key: &str, policy: OutcomePolicy) -> Result<Self> {
        Self::with_client(base_url, model, api_key, policy, BasicClient::new())
    }
}

impl<C: HttpClient> GeminiClient<C> {
    pub fn with_client(
        base_url: &str,
        model: &str,
        api_key: &str,
        policy: OutcomePolicy,
        http: C,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            policy,
            http: ApiKey::goog(http, api_key)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl<C: HttpClient> SummaryProvider for GeminiClient<C> {
    #[instrument(skip(self, records), fields(model = %self.model, students = records.len()))]
    async fn summarize(&self, records: &[StudentRecord]) -> Result<String> {
        let payload = build_payload(records, &self.policy);
        let prompt = build_prompt(&payload)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let req = json_request(&self.endpoint(), &body)?;
        let resp: GenerateResponse = send_json(&self.http, req)
            .await
            .map_err(|e| DashboardError::UpstreamAi(e.to_string()))?;

        let text = resp
            .text()
            .ok_or_else(|| DashboardError::UpstreamAi("model returned no text".into()))?;
        debug!(chars = text.len(), "Summary generated");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_shape() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com/",
            "gemini-2.5-pro",
            "k",
            OutcomePolicy::default(),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r####"{"candidates":[{"content":{"role":"model","parts":[{"text":"### A\n"},{"text":"* b"}]}}]}"####,
        )
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("### A\n* b"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.text(), None);
    }
}
