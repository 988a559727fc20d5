use crate::error::{DashboardError, Result};
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once at construction; the value is
/// marked sensitive so it stays out of debug output.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| DashboardError::Config(format!("invalid header name {header_name:?}: {e}")))?;
        let mut key = HeaderValue::from_str(key)
            .map_err(|_| DashboardError::Config("API key contains invalid header characters".into()))?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// `x-goog-api-key: <key>`, as expected by the generative-language API.
    pub fn goog(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, "x-goog-api-key", key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}
