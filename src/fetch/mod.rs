mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{DashboardError, Result};

pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        parse_url(url)?,
    );

    let resp = checked(client.execute(req).await?).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Sends `req` and decodes a JSON body, surfacing the server's error message on non-2xx.
pub async fn send_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    req: reqwest::Request,
) -> Result<T> {
    let resp = checked(client.execute(req).await?).await?;
    resp.json::<T>()
        .await
        .map_err(|e| DashboardError::Network(format!("Failed to parse response: {e}")))
}

/// Builds a request carrying a JSON body.
pub fn json_request<B: serde::Serialize>(url: &str, body: &B) -> Result<reqwest::Request> {
    let mut req = reqwest::Request::new(reqwest::Method::POST, parse_url(url)?);
    let payload = serde_json::to_vec(body)
        .map_err(|e| DashboardError::Network(format!("Failed to encode request: {e}")))?;
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    *req.body_mut() = Some(payload.into());
    Ok(req)
}

pub fn parse_url(url: &str) -> Result<reqwest::Url> {
    url.parse()
        .map_err(|e| DashboardError::Network(format!("invalid URL {url:?}: {e}")))
}

async fn checked(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    debug!(%status, body_len = body.len(), "Non-success response");
    Err(DashboardError::Network(error_message(status, &body)))
}

/// The server-provided message from `{"error": "..."}` or
/// `{"error": {"message": "..."}}`, falling back to the status code.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let server_message = json.as_ref().and_then(|v| {
        v["error"]
            .as_str()
            .or_else(|| v["error"]["message"].as_str())
            .map(str::to_string)
    });

    server_message
        .unwrap_or_else(|| format!("Backend responded with status {}", status.as_u16()))
}
