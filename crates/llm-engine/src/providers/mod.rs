//! Provider adapters. Each one owns its request envelope and stream framing.

mod anthropic;
mod gemini;
mod openai;

use std::time::Duration;

use reqwest::Client;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::config::{LlmSettings, ProviderKind};
use crate::error::LlmError;
use crate::provider::{LlmProvider, ProviderInfo};

/// Upper bound on completion length for every provider.
pub(crate) const MAX_TOKENS: u32 = 500;
pub(crate) const TEMPERATURE: f64 = 0.7;

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client, LlmError> {
    Ok(Client::builder()
        .user_agent("Gambit/1.0")
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Build the adapter `settings` name.
pub fn create_provider(settings: &LlmSettings) -> Result<Box<dyn LlmProvider>, LlmError> {
    let api_key = settings
        .api_key
        .clone()
        .ok_or_else(|| LlmError::Config("LLM_API_KEY is not set".into()))?;
    let client = http_client(settings.timeout_secs)?;
    let model = settings.model.clone();
    let proxy = settings.proxy_url.clone();

    let provider: Box<dyn LlmProvider> = match settings.provider {
        ProviderKind::OpenAi | ProviderKind::Groq => Box::new(OpenAiProvider::new(
            client,
            settings.provider,
            api_key,
            model,
            proxy,
        )),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(client, api_key, model, proxy)),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(client, api_key, model, proxy)),
    };
    Ok(provider)
}

/// Catalogue of every supported provider.
pub fn all_provider_infos() -> Vec<ProviderInfo> {
    vec![
        openai::info(ProviderKind::OpenAi),
        anthropic::info(),
        gemini::info(),
        openai::info(ProviderKind::Groq),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = LlmSettings::default();
        assert!(matches!(create_provider(&settings), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_catalogue_defaults() {
        for info in all_provider_infos() {
            assert_eq!(info.default_model, info.kind.default_model());
            assert!(info.models.iter().any(|m| m.id == info.default_model));
        }
    }

    #[test]
    fn test_create_groq() {
        let settings = LlmSettings {
            provider: ProviderKind::Groq,
            api_key: Some("gsk-test".into()),
            model: "llama-3.1-8b-instant".into(),
            ..LlmSettings::default()
        };
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.info().kind, ProviderKind::Groq);
        assert_eq!(provider.model(), "llama-3.1-8b-instant");
    }
}
