use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{DashboardError, Result};
use crate::fetch::{BasicClient, HttpClient, json_request, parse_url, send_json};
use crate::record::StudentRecord;
use crate::services::dashboard_api::{
    DashboardApi, DashboardData, DateRange, DropoutsData, PredictionInput, ScoresData, TrendsData,
};
use crate::services::summary::SummaryProvider;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRequest<'a> {
    student_data: &'a [StudentRecord],
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Deserialize)]
struct PredictionResponse {
    completion_likelihood: f64,
}

/// Client for the analytics backend (`/dashboard-data`, `/scores-data`, ...).
pub struct BackendClient<C = BasicClient> {
    base_url: String,
    http: C,
}

impl BackendClient<BasicClient> {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, BasicClient::new())
    }
}

impl<C: HttpClient> BackendClient<C> {
    pub fn with_client(base_url: &str, http: C) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = reqwest::Request::new(reqwest::Method::GET, parse_url(&self.url(path))?);
        send_json(&self.http, req).await
    }
}

#[async_trait]
impl<C: HttpClient> DashboardApi for BackendClient<C> {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn dashboard_data(&self, range: DateRange) -> Result<DashboardData> {
        let mut url = parse_url(&self.url("dashboard-data"))?;
        let pairs = range.query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in &pairs {
                query.append_pair(name, value);
            }
        }

        let req = reqwest::Request::new(reqwest::Method::GET, url);
        let data: DashboardData = send_json(&self.http, req).await?;
        debug!(students = data.student_data.len(), "Dashboard data received");
        Ok(data)
    }

    #[instrument(skip(self))]
    async fn trends_data(&self) -> Result<TrendsData> {
        self.get("trends-data").await
    }

    #[instrument(skip(self))]
    async fn scores_data(&self) -> Result<ScoresData> {
        self.get("scores-data").await
    }

    #[instrument(skip(self))]
    async fn dropouts_data(&self) -> Result<DropoutsData> {
        self.get("dropouts-data").await
    }

    #[instrument(skip(self))]
    async fn predict(&self, input: PredictionInput) -> Result<f64> {
        let req = json_request(&self.url("predict"), &input)?;
        let resp: PredictionResponse = send_json(&self.http, req).await?;

        let likelihood = resp.completion_likelihood;
        if !(0.0..=1.0).contains(&likelihood) {
            return Err(DashboardError::Network(format!(
                "completion likelihood out of range: {likelihood}"
            )));
        }
        Ok(likelihood)
    }
}

#[async_trait]
impl<C: HttpClient> SummaryProvider for BackendClient<C> {
    #[instrument(skip(self, records), fields(students = records.len()))]
    async fn summarize(&self, records: &[StudentRecord]) -> Result<String> {
        let req = json_request(
            &self.url("ai-summary"),
            &SummaryRequest {
                student_data: records,
            },
        )?;
        let resp: SummaryResponse = send_json(&self.http, req)
            .await
            .map_err(|e| DashboardError::UpstreamAi(e.to_string()))?;
        Ok(resp.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = BackendClient::new("http://127.0.0.1:5000/api/");
        assert_eq!(client.url("scores-data"), "http://127.0.0.1:5000/api/scores-data");
    }
}
