use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::time::Duration;

use super::stream::drain_stream;
use super::{classify_http_error, LlmClient, LlmError};

/// Minimal request/response structs for OpenAI Chat Completions API.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct StreamResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// OpenAI-compatible implementation of LlmClient.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base_url: String,
    stream: bool,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, api_base_url: String, stream: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .expect("failed to build HTTP client");

        OpenAiClient {
            client,
            api_key,
            model,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            stream,
        }
    }

    fn chat_url(&self) -> String {
        if self.api_base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.api_base_url)
        } else {
            format!("{}/v1/chat/completions", self.api_base_url)
        }
    }

    fn call_chat(&self, req: &ChatRequest) -> Result<String, LlmError> {
        if req.stream {
            return self.call_chat_streaming(req);
        }

        let url = self.chat_url();

        log::info!("Calling OpenAI model {:?}", &req.model);

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().unwrap_or_default();
            return Err(classify_http_error(status, &text));
        }

        let chat_resp: ChatResponse = resp
            .json()
            .map_err(|e| LlmError::Decode(format!("OpenAI response: {e}")))?;
        let content = chat_resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::Decode("no choices returned from OpenAI".into()))?;

        if let Some(usage) = &chat_resp.usage {
            log::info!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        Ok(content)
    }

    fn call_chat_streaming(&self, req: &ChatRequest) -> Result<String, LlmError> {
        let url = self.chat_url();

        log::info!("Streaming OpenAI model {:?}", &req.model);

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().unwrap_or_default();
            return Err(classify_http_error(status, &text));
        }

        let reader = BufReader::new(resp);
        drain_stream(reader, parse_stream_line, true)
    }
}

fn parse_stream_line(line: &str) -> Result<Option<String>, LlmError> {
    let line = line.trim_start();
    if !line.starts_with("data:") {
        return Ok(None);
    }

    let data = line.trim_start_matches("data:").trim();
    if data == "[DONE]" {
        return Ok(None);
    }

    let chunk: StreamResponse = serde_json::from_str(data)
        .map_err(|e| LlmError::Decode(format!("OpenAI streaming chunk: {e}")))?;
    let content = chunk.choices.first().and_then(|c| c.delta.content.clone());

    Ok(content)
}

/// Effective context window per model family. Values are deliberately a bit
/// conservative; the retry loop absorbs the imprecision.
fn context_window(model: &str) -> usize {
    if model.starts_with("gpt-4.1") {
        900_000
    } else if model.starts_with("gpt-5") {
        400_000
    } else if model.starts_with("gpt-4o") || model.starts_with("o3") || model.starts_with("o4") {
        128_000
    } else if model.starts_with("gpt-3.5") {
        16_000
    } else {
        128_000
    }
}

impl LlmClient for OpenAiClient {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user_prompt.to_string(),
                },
            ],
            stream: self.stream,
        };

        self.call_chat(&req)
    }

    fn token_budget(&self) -> usize {
        context_window(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_lines_parse_data_frames_only() {
        let piece =
            parse_stream_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap();
        assert_eq!(piece.as_deref(), Some("Hi"));

        assert!(parse_stream_line("event: ping").unwrap().is_none());
        assert!(parse_stream_line("data: [DONE]").unwrap().is_none());
    }

    #[test]
    fn model_families_map_to_windows() {
        assert_eq!(context_window("gpt-4.1-mini"), 900_000);
        assert_eq!(context_window("gpt-5-nano"), 400_000);
        assert_eq!(context_window("gpt-4o-mini"), 128_000);
        assert_eq!(context_window("gpt-3.5-turbo"), 16_000);
        assert_eq!(context_window("some-unknown-model"), 128_000);
    }
}
