//! Concrete HTTP collaborators behind the [`crate::services`] traits.

pub mod backend;
pub mod gemini;

use tracing::{info, warn};

use crate::config::{Settings, SummarySource};
use crate::services::summary::{SummaryProvider, Unavailable, Unconfigured};

/// Picks the summary provider the settings ask for. A missing Gemini key
/// yields [`Unconfigured`]; a key that cannot be used yields [`Unavailable`],
/// so credential problems surface as a summary message instead of an error.
pub fn summary_provider(settings: &Settings) -> Box<dyn SummaryProvider> {
    match (settings.summary, settings.gemini.api_key.as_deref()) {
        (SummarySource::Backend, _) => Box::new(backend::BackendClient::new(&settings.backend_url)),
        (SummarySource::Gemini, Some(key)) => match gemini::GeminiClient::new(
            &settings.gemini.base_url,
            &settings.gemini.model,
            key,
            settings.policy.clone(),
        ) {
            Ok(client) => Box::new(client),
            Err(e) => {
                warn!(error = %e, "Gemini client unavailable");
                Box::new(Unavailable(e.to_string()))
            }
        },
        (SummarySource::Gemini, None) => {
            info!("GEMINI_API_KEY not set, AI summary disabled");
            Box::new(Unconfigured)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::engagement;
    use crate::services::summary::{PLACEHOLDER, summarize_or_message};

    #[tokio::test]
    async fn test_missing_key_degrades_to_placeholder() {
        let provider = summary_provider(&Settings::default());
        assert_eq!(provider.summarize(&[]).await.unwrap(), PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_unusable_key_degrades_to_message() {
        let mut settings = Settings::default();
        settings.gemini.api_key = Some("abc\n123".into());
        let provider = summary_provider(&settings);

        let records = vec![engagement("1", "Math", 2.0, &[70.0], true)];
        let text = summarize_or_message(provider.as_ref(), &records).await;
        assert!(text.starts_with("### AI Insights Error\nFailed to get insights: AI summary unavailable:"));
        assert!(text.contains("invalid header characters"));
    }
}
