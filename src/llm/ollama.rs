use musli::json;
use musli::{Decode, Encode};
use reqwest::blocking::Client;
use std::io::BufReader;

use super::stream::drain_stream;
use super::{classify_http_error, LlmClient, LlmError};

#[derive(Debug, Encode, Decode)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Decode)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Decode)]
struct OllamaStreamResponse {
    message: Option<OllamaMessage>,
    done: Option<bool>,
}

/// Synchronous Ollama client using /api/chat.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    stream: bool,
    /// Context length the local model is served with (`num_ctx`).
    num_ctx: usize,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        stream: bool,
        num_ctx: usize,
    ) -> Self {
        let http = Client::builder().build().expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            stream,
            num_ctx,
        }
    }

    /// Internal helper to talk to /api/chat.
    fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        // Request structs we encode with musli::json.
        #[derive(Debug, Encode)]
        struct ChatMessage {
            role: String,
            content: String,
        }

        #[derive(Debug, Encode)]
        struct ChatRequest {
            model: String,
            stream: bool,
            messages: Vec<ChatMessage>,
        }

        let req_body = ChatRequest {
            model: self.model.clone(),
            stream: self.stream,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
        };

        let body_str = json::to_string(&req_body)
            .map_err(|e| LlmError::Decode(format!("encoding Ollama request: {e}")))?;

        log::trace!("Ollama request body: {body_str}");

        let url = format!("{}/api/chat", self.base_url);

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body_str)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().unwrap_or_default();
            return Err(classify_http_error(status, &text));
        }

        if self.stream {
            let reader = BufReader::new(resp);
            return drain_stream(reader, parse_stream_line, true);
        }

        let resp_text = resp
            .text()
            .map_err(|e| LlmError::Decode(format!("reading Ollama response body: {e}")))?;

        log::trace!("Ollama raw JSON response: {resp_text}");

        let parsed: OllamaChatResponse = json::from_str(&resp_text)
            .map_err(|e| LlmError::Decode(format!("decoding Ollama JSON: {e}")))?;

        Ok(parsed.message.content.trim().to_string())
    }
}

fn parse_stream_line(line: &str) -> Result<Option<String>, LlmError> {
    let parsed: OllamaStreamResponse = json::from_str(line)
        .map_err(|e| LlmError::Decode(format!("decoding Ollama stream JSON: {e}")))?;

    if parsed.done.unwrap_or(false) {
        return Ok(None);
    }

    let content = parsed
        .message
        .and_then(|m| if m.content.is_empty() { None } else { Some(m.content) });

    Ok(content)
}

impl LlmClient for OllamaClient {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        self.chat(system_prompt, user_prompt)
    }

    fn token_budget(&self) -> usize {
        self.num_ctx
    }
}
