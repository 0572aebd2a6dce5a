//! Anthropic messages API. Text arrives in `content_block_delta` events and
//! `message_stop` ends the stream.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::debug;

use super::MAX_TOKENS;
use crate::config::ProviderKind;
use crate::error::LlmError;
use crate::provider::{check_status, drive_stream, Frame, LlmProvider, ModelInfo, ProviderInfo, StreamChunk};

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    proxy_url: Option<String>,
}

impl AnthropicProvider {
    pub fn new(client: Client, api_key: String, model: String, proxy_url: Option<String>) -> Self {
        Self {
            client,
            api_key,
            model,
            proxy_url,
        }
    }

    fn post(&self) -> RequestBuilder {
        let endpoint = self.proxy_url.as_deref().unwrap_or(ENDPOINT);
        self.client
            .post(endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
    }
}

pub(super) fn info() -> ProviderInfo {
    ProviderInfo {
        kind: ProviderKind::Anthropic,
        name: "Anthropic (Claude)",
        models: vec![
            ModelInfo { id: "claude-sonnet-4-20250514", name: "Claude Sonnet 4" },
            ModelInfo { id: "claude-3-5-haiku-20241022", name: "Claude 3.5 Haiku" },
        ],
        default_model: "claude-sonnet-4-20250514",
    }
}

pub(crate) fn extract_event(payload: &str) -> Frame {
    let Ok(parsed) = serde_json::from_str::<Value>(payload) else {
        return Frame::Skip;
    };
    match parsed.get("type").and_then(|t| t.as_str()) {
        Some("content_block_delta") => parsed
            .pointer("/delta/text")
            .and_then(|v| v.as_str())
            .map(|s| Frame::Text(s.to_string()))
            .unwrap_or(Frame::Skip),
        Some("message_stop") => Frame::Done,
        _ => Frame::Skip,
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
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
        debug!(provider = "anthropic", model = %self.model, "Requesting completion");
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system_prompt,
            "messages": [{ "role": "user", "content": user_prompt }],
            "stream": true,
        });
        let response = check_status(self.post().json(&body).send().await?)?;
        drive_stream(response, on_chunk, extract_event).await
    }

    async fn validate_credential(&self) -> bool {
        let body = json!({
            "model": self.model,
            "max_tokens": 10,
            "messages": [{ "role": "user", "content": "hi" }],
        });
        self.post()
            .json(&body)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_event() {
        let delta = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"e7e5"}}"#;
        assert_eq!(extract_event(delta), Frame::Text("e7e5".into()));
        assert_eq!(extract_event(r#"{"type":"message_start","message":{}}"#), Frame::Skip);
        assert_eq!(extract_event(r#"{"type":"message_stop"}"#), Frame::Done);
        assert_eq!(extract_event("[DONE]"), Frame::Skip);
    }
}
