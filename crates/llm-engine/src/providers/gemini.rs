//! Google Gemini `streamGenerateContent` in SSE mode.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{MAX_TOKENS, TEMPERATURE};
use crate::config::ProviderKind;
use crate::error::LlmError;
use crate::provider::{check_status, drive_stream, Frame, LlmProvider, ModelInfo, ProviderInfo, StreamChunk};

const BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    proxy_url: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, api_key: String, model: String, proxy_url: Option<String>) -> Self {
        Self {
            client,
            api_key,
            model,
            proxy_url,
        }
    }

    fn endpoint(&self) -> String {
        match &self.proxy_url {
            Some(proxy) => proxy.clone(),
            None => format!(
                "{BASE}/{}:streamGenerateContent?alt=sse&key={}",
                self.model, self.api_key
            ),
        }
    }
}

pub(super) fn info() -> ProviderInfo {
    ProviderInfo {
        kind: ProviderKind::Gemini,
        name: "Google Gemini",
        models: vec![
            ModelInfo { id: "gemini-2.0-flash", name: "Gemini 2.0 Flash" },
            ModelInfo { id: "gemini-1.5-pro", name: "Gemini 1.5 Pro" },
        ],
        default_model: "gemini-2.0-flash",
    }
}

/// Gemini has no terminator frame; the stream simply ends.
pub(crate) fn extract_candidate(payload: &str) -> Frame {
    serde_json::from_str::<Value>(payload)
        .ok()
        .and_then(|parsed| {
            parsed
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(|v| v.as_str())
                .map(|s| Frame::Text(s.to_string()))
        })
        .unwrap_or(Frame::Skip)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn info(&self) -> ProviderInfo {
        info()
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
        debug!(provider = "gemini", model = %self.model, "Requesting completion");
        let body = json!({
            "system_instruction": { "parts": [{ "text": system_prompt }] },
            "contents": [{ "parts": [{ "text": user_prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_TOKENS,
            },
        });
        let response = check_status(self.client.post(self.endpoint()).json(&body).send().await?)?;
        drive_stream(response, on_chunk, extract_candidate).await
    }

    async fn validate_credential(&self) -> bool {
        self.client
            .get(BASE)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
