//! OpenAI chat completions, also used for Groq's compatible endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{MAX_TOKENS, TEMPERATURE};
use crate::config::ProviderKind;
use crate::error::LlmError;
use crate::provider::{check_status, drive_stream, Frame, LlmProvider, ModelInfo, ProviderInfo, StreamChunk};

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const GROQ_BASE: &str = "https://api.groq.com/openai/v1";

pub struct OpenAiProvider {
    client: Client,
    kind: ProviderKind,
    api_key: String,
    model: String,
    proxy_url: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        client: Client,
        kind: ProviderKind,
        api_key: String,
        model: String,
        proxy_url: Option<String>,
    ) -> Self {
        Self {
            client,
            kind,
            api_key,
            model,
            proxy_url,
        }
    }

    fn base(&self) -> &'static str {
        match self.kind {
            ProviderKind::Groq => GROQ_BASE,
            _ => OPENAI_BASE,
        }
    }

    fn endpoint(&self) -> String {
        self.proxy_url
            .clone()
            .unwrap_or_else(|| format!("{}/chat/completions", self.base()))
    }
}

pub(super) fn info(kind: ProviderKind) -> ProviderInfo {
    match kind {
        ProviderKind::Groq => ProviderInfo {
            kind,
            name: "Groq",
            models: vec![
                ModelInfo { id: "llama-3.3-70b-versatile", name: "Llama 3.3 70B" },
                ModelInfo { id: "mixtral-8x7b-32768", name: "Mixtral 8x7B" },
                ModelInfo { id: "llama-3.1-8b-instant", name: "Llama 3.1 8B" },
            ],
            default_model: "llama-3.3-70b-versatile",
        },
        _ => ProviderInfo {
            kind: ProviderKind::OpenAi,
            name: "OpenAI",
            models: vec![
                ModelInfo { id: "gpt-4o", name: "GPT-4o" },
                ModelInfo { id: "gpt-4o-mini", name: "GPT-4o Mini" },
                ModelInfo { id: "gpt-4-turbo", name: "GPT-4 Turbo" },
                ModelInfo { id: "o1-mini", name: "o1-mini" },
            ],
            default_model: "gpt-4o",
        },
    }
}

fn request_body(model: &str, system_prompt: &str, user_prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_prompt },
        ],
        "stream": true,
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    })
}

/// `choices[0].delta.content` of one chunk; `[DONE]` ends the stream.
pub(crate) fn extract_delta(payload: &str) -> Frame {
    if payload == "[DONE]" {
        return Frame::Done;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(parsed) => parsed
            .pointer("/choices/0/delta/content")
            .and_then(|v| v.as_str())
            .map(|s| Frame::Text(s.to_string()))
            .unwrap_or(Frame::Skip),
        Err(_) => Frame::Skip,
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn info(&self) -> ProviderInfo {
        info(self.kind)
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        on_chunk: &mut (dyn FnMut(StreamChunk) + Send),
    ) -> Result<String, LlmError> {
        debug!(provider = %self.kind, model = %self.model, "Requesting completion");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, system_prompt, user_prompt))
            .send()
            .await?;
        let response = check_status(response)?;
        drive_stream(response, on_chunk, extract_delta).await
    }

    async fn validate_credential(&self) -> bool {
        self.client
            .get(format!("{}/models", self.base()))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
