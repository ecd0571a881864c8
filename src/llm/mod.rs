pub mod ollama;
pub mod openai;
pub mod prompt_builder;
mod prompts;
pub mod retry;
mod stream;

use thiserror::Error;

/// Failure taxonomy for one generate call.
///
/// `ContextOverflow` is the only variant the retry loop reacts to; everything
/// else propagates immediately because shrinking the diff cannot fix it.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request exceeded the model context window: {0}")]
    ContextOverflow(String),

    #[error("backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("network error talking to backend: {0}")]
    Network(#[from] reqwest::Error),

    #[error("stream interrupted: {0}")]
    Interrupted(#[from] std::io::Error),

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("backend returned an empty message")]
    Empty,
}

impl LlmError {
    /// Size-class failures are the only ones worth retrying with a smaller
    /// payload.
    pub fn is_context_overflow(&self) -> bool {
        matches!(self, LlmError::ContextOverflow(_))
    }
}

/// Map an HTTP error response onto the taxonomy. 413 is always size-class;
/// 400 and 429 are size-class only when the body says so, since both codes
/// also cover auth mistakes and ordinary rate limiting.
pub(crate) fn classify_http_error(status: u16, body: &str) -> LlmError {
    let lower = body.to_ascii_lowercase();
    let oversize = status == 413
        || ((status == 400 || status == 429)
            && (lower.contains("context length")
                || lower.contains("context window")
                || lower.contains("maximum context")
                || lower.contains("too many tokens")
                || lower.contains("tokens per min")
                || lower.contains("request too large")));

    if oversize {
        LlmError::ContextOverflow(format!("HTTP {status}: {body}"))
    } else {
        LlmError::Api {
            status,
            body: body.to_string(),
        }
    }
}

/// One LLM backend. `generate` returns the complete message text; a backend
/// may stream internally and echo pieces as they arrive, but the caller only
/// ever sees the finished result or a terminal error.
pub trait LlmClient: Send + Sync {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;

    /// Effective context ceiling for this backend/model, in tokens.
    fn token_budget(&self) -> usize;
}

/// Offline client for `--no-model`: deterministic output, no network.
pub struct NoopClient;

impl LlmClient for NoopClient {
    fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let mut msg = String::from("Dummy message for testing\n\n(LLM disabled)\n\nPrompt preview:\n");
        for line in user_prompt.lines().take(12) {
            msg.push_str(line);
            msg.push('\n');
        }
        Ok(msg)
    }

    fn token_budget(&self) -> usize {
        8_000
    }
}
