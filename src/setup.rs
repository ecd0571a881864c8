use anyhow::{anyhow, Result};
use log::debug;

use crate::config::{Config, Provider};
use crate::llm::ollama::OllamaClient;
use crate::llm::openai::OpenAiClient;
use crate::llm::{LlmClient, NoopClient};

/// Context length assumed for a local Ollama model unless overridden via the
/// `token_budget` config key.
const OLLAMA_DEFAULT_CTX: usize = 4_096;

/// Build the LLM client based on CLI + config.
pub fn build_llm_client(cfg: &Config) -> Result<Box<dyn LlmClient>> {
    match cfg.provider {
        Provider::None => {
            debug!("Using NoopClient (no model calls)");
            Ok(Box::new(NoopClient))
        }
        Provider::Ollama => {
            debug!("Using OllamaClient at {} with model {}", cfg.ollama_url, cfg.model);
            Ok(Box::new(OllamaClient::new(
                cfg.ollama_url.clone(),
                cfg.model.clone(),
                cfg.stream,
                cfg.token_budget.unwrap_or(OLLAMA_DEFAULT_CTX),
            )))
        }
        Provider::OpenAi => {
            let key = cfg.api_key.clone().ok_or_else(|| {
                anyhow!("OPENAI_API_KEY (or --api-key) is required unless --no-model is used")
            })?;

            debug!("Using OpenAiClient with model: {}", cfg.model);

            Ok(Box::new(OpenAiClient::new(
                key,
                cfg.model.clone(),
                cfg.api_base_url.clone(),
                cfg.stream,
            )))
        }
    }
}
