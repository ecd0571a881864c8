use crate::cli_args::Cli;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Which backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Ollama,
    /// No network at all; deterministic dummy output.
    None,
}

/// Final resolved configuration for gitscribe.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub ollama_url: String,
    pub stream: bool,
    /// Extra ignore patterns applied on top of the built-in noise rules.
    pub ignore_paths: Vec<String>,
    /// Fixed token-budget override; wins over whatever the backend reports.
    pub token_budget: Option<usize>,
    /// Output language for generated text, e.g. "German".
    pub language: Option<String>,
    /// Project style-guide text appended to the system prompt.
    pub style_guide: Option<String>,
    /// Pattern for extracting a ticket reference from the branch name.
    pub ticket_pattern: String,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and
    /// defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--model`, `--provider`, ...)
    ///   2. Env vars (`GITSCRIBE_MODEL`, `OPENAI_API_KEY`)
    ///   3. TOML `~/.config/gitscribe.toml`
    ///   4. Hardcoded defaults
    pub fn from_sources(cli: &Cli) -> Self {
        let file_cfg = load_file_config().unwrap_or_default();

        let provider = if cli.no_model || cli.model.as_deref() == Some("none") {
            Provider::None
        } else {
            let name = cli
                .provider
                .clone()
                .or_else(|| env::var("GITSCRIBE_PROVIDER").ok())
                .or(file_cfg.provider)
                .unwrap_or_else(|| "openai".to_string());
            match name.to_lowercase().as_str() {
                "ollama" => Provider::Ollama,
                "none" => Provider::None,
                _ => Provider::OpenAi,
            }
        };

        let model = cli
            .model
            .clone()
            .or_else(|| env::var("GITSCRIBE_MODEL").ok())
            .or(file_cfg.model)
            .unwrap_or_else(|| "gpt-5-nano".to_string());

        let api_key = cli
            .api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .or(file_cfg.api_key);

        let style_guide = file_cfg.style_guide.or_else(|| {
            let path = file_cfg.style_guide_path?;
            fs::read_to_string(path).ok()
        });

        Config {
            provider,
            model,
            api_key,
            api_base_url: file_cfg
                .api_base_url
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            ollama_url: file_cfg
                .ollama_url
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            stream: file_cfg.stream.unwrap_or(true),
            ignore_paths: file_cfg.ignore_paths.unwrap_or_default(),
            token_budget: cli.budget.or(file_cfg.token_budget),
            language: cli.language.clone().or(file_cfg.language),
            style_guide,
            ticket_pattern: file_cfg
                .ticket_pattern
                .unwrap_or_else(|| r"[A-Z][A-Z0-9]+-\d+".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub ollama_url: Option<String>,
    pub stream: Option<bool>,
    pub ignore_paths: Option<Vec<String>>,
    pub token_budget: Option<usize>,
    pub language: Option<String>,
    pub style_guide: Option<String>,
    pub style_guide_path: Option<String>,
    pub ticket_pattern: Option<String>,
}

/// Return `~/.config/gitscribe.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("gitscribe.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        return None;
    }

    let data = fs::read_to_string(&path).ok()?;
    match toml::from_str::<FileConfig>(&data) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("ignoring unreadable config at {:?}: {err}", path);
            None
        }
    }
}
