//! Provider contract and the server-sent-event plumbing every adapter shares.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::config::ProviderKind;
use crate::error::LlmError;

/// One streamed piece of completion text. The last chunk of a stream is
/// always `done` with empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub text: String,
    pub done: bool,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            text: String::new(),
            done: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub kind: ProviderKind,
    pub name: &'static str,
    pub models: Vec<ModelInfo>,
    pub default_model: &'static str,
}

/// A remote model reachable through a streaming completion call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn info(&self) -> ProviderInfo;

    /// Model id requests are sent to.
    fn model(&self) -> &str;

    /// Stream a completion, forwarding chunks in arrival order, and return
    /// the accumulated text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        on_chunk: &mut (dyn FnMut(StreamChunk) + Send),
    ) -> Result<String, LlmError>;

    /// Cheap authenticated request; `false` on any failure.
    async fn validate_credential(&self) -> bool;
}

/// What a provider-specific extractor made of one `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Done,
    Skip,
}

/// Splits a byte stream into `data:` payloads. Partial lines are buffered
/// until their newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Payload of a trailing line that never got its newline.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let payload = line.trim_end_matches(['\r', '\n']).strip_prefix("data: ")?;
    Some(payload.trim().to_string())
}

/// Turn a non-2xx response into [`LlmError::Http`].
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(LlmError::Http {
            status: status.as_u16(),
        })
    }
}

/// Read an SSE body to the end, handing each payload to `extract`.
pub(crate) async fn drive_stream<F>(
    response: reqwest::Response,
    on_chunk: &mut (dyn FnMut(StreamChunk) + Send),
    extract: F,
) -> Result<String, LlmError>
where
    F: Fn(&str) -> Frame + Send,
{
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::default();
    let mut full_text = String::new();

    while let Some(bytes) = body.next().await {
        let bytes = bytes.map_err(|e| LlmError::Stream(e.to_string()))?;
        for payload in decoder.push(&bytes) {
            if apply_frame(extract(&payload), &mut full_text, on_chunk) {
                return Ok(full_text);
            }
        }
    }

    if let Some(payload) = decoder.finish() {
        if apply_frame(extract(&payload), &mut full_text, on_chunk) {
            return Ok(full_text);
        }
    }

    debug!(chars = full_text.len(), "Stream ended without terminator");
    on_chunk(StreamChunk::done());
    Ok(full_text)
}

/// Returns `true` once the stream is finished.
fn apply_frame(
    frame: Frame,
    full_text: &mut String,
    on_chunk: &mut (dyn FnMut(StreamChunk) + Send),
) -> bool {
    match frame {
        Frame::Text(text) if !text.is_empty() => {
            full_text.push_str(&text);
            on_chunk(StreamChunk::text(text));
            false
        }
        Frame::Done => {
            on_chunk(StreamChunk::done());
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_buffers_partial_lines() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        let payloads = decoder.push(b"1}\n\nevent: ping\ndata: [DONE]\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn test_decoder_crlf_and_trailing() {
        let mut decoder = SseDecoder::default();
        assert_eq!(decoder.push(b"data: one\r\n"), vec!["one".to_string()]);
        decoder.push(b"data: two");
        assert_eq!(decoder.finish().as_deref(), Some("two"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_split_multibyte_char() {
        let mut decoder = SseDecoder::default();
        let bytes = "data: é\n".as_bytes();
        assert!(decoder.push(&bytes[..7]).is_empty());
        assert_eq!(decoder.push(&bytes[7..]), vec!["é".to_string()]);
    }

    #[test]
    fn test_apply_frame() {
        let mut full = String::new();
        let mut seen = Vec::new();
        let mut sink = |c: StreamChunk| seen.push(c);
        assert!(!apply_frame(Frame::Text("e2".into()), &mut full, &mut sink));
        assert!(!apply_frame(Frame::Skip, &mut full, &mut sink));
        assert!(!apply_frame(Frame::Text(String::new()), &mut full, &mut sink));
        assert!(apply_frame(Frame::Done, &mut full, &mut sink));
        assert_eq!(full, "e2");
        assert_eq!(seen, vec![StreamChunk::text("e2"), StreamChunk::done()]);
    }
}
