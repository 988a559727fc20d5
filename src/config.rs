//! Runtime settings.
//!
//! Stored as a JSON object on disk, every field optional:
//! ```json
//! {
//!   "schema": "demographic",
//!   "policy": { "completion_score": 60, "dropout_score": 40, "score_max": 100 },
//!   "bins": [{ "label": "low", "lower": 0, "upper": 50 }, { "label": "high", "lower": 50, "upper": 100, "inclusive_upper": true }],
//!   "backend_url": "http://127.0.0.1:5000/api",
//!   "summary": "gemini",
//!   "gemini": { "model": "gemini-2.5-pro" }
//! }
//! ```
//! Environment variables `GEMINI_API_KEY`, `GEMINI_MODEL` and
//! `DASHBOARD_API_URL` override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analyzers::bins::{Bin, BinSpec};
use crate::analyzers::standing::OutcomePolicy;
use crate::error::{DashboardError, Result};
use crate::record::Schema;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";

/// Where AI summaries come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    #[default]
    Gemini,
    Backend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub schema: Schema,
    pub policy: OutcomePolicy,
    /// Custom score bins; the Fail..Excellent bands are used when absent.
    pub bins: Option<Vec<Bin>>,
    pub backend_url: String,
    pub summary: SummarySource,
    pub gemini: GeminiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            policy: OutcomePolicy::default(),
            bins: None,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            summary: SummarySource::default(),
            gemini: GeminiSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("{}: {e}", path.display())))
    }

    /// File settings (or defaults when no path is given) with process env overrides applied.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok());
        settings.policy.validate()?;
        Ok(settings)
    }

    /// Applies overrides from `lookup`. Values are trimmed; blank values are ignored.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = get("DASHBOARD_API_URL") {
            self.backend_url = url;
        }
    }

    pub fn bin_spec(&self) -> Result<BinSpec> {
        match &self.bins {
            Some(bins) => BinSpec::new(bins.clone()),
            None => {
                self.policy.validate()?;
                Ok(BinSpec::grade_bands(self.policy.score_max))
            }
        }
    }
}
