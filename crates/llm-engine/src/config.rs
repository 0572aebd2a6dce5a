//! Remote backend settings from environment variables

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Groq,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Groq => "llama-3.3-70b-versatile",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            "groq" => Ok(ProviderKind::Groq),
            other => Err(LlmError::Config(format!("Unknown provider: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStyle {
    Aggressive,
    Defensive,
    #[default]
    Balanced,
}

impl PlayStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayStyle::Aggressive => "aggressive",
            PlayStyle::Defensive => "defensive",
            PlayStyle::Balanced => "balanced",
        }
    }
}

impl FromStr for PlayStyle {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(PlayStyle::Aggressive),
            "defensive" => Ok(PlayStyle::Defensive),
            "balanced" => Ok(PlayStyle::Balanced),
            other => Err(LlmError::Config(format!("Unknown play style: {other}"))),
        }
    }
}

/// Everything needed to reach one provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub enabled: bool,
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub proxy_url: Option<String>,
    pub play_style: PlayStyle,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: ProviderKind::OpenAi,
            api_key: None,
            model: ProviderKind::OpenAi.default_model().to_string(),
            proxy_url: None,
            play_style: PlayStyle::Balanced,
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

impl LlmSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        let defaults = Self::default();

        let enabled = env::var("LLM_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.enabled);

        let provider = match env::var("LLM_PROVIDER") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => defaults.provider,
        };

        let api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty());

        let model = env::var("LLM_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let proxy_url = env::var("LLM_PROXY_URL").ok().filter(|u| !u.trim().is_empty());

        let play_style = match env::var("LLM_PLAY_STYLE") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => defaults.play_style,
        };

        let max_retries = env::var("LLM_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_retries);

        let timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Ok(Self {
            enabled,
            provider,
            api_key,
            model,
            proxy_url,
            play_style,
            max_retries,
            timeout_secs,
        })
    }

    /// The remote backend is only used when switched on and given a key.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    /// `provider/model`, recorded on every game played against this backend.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}
