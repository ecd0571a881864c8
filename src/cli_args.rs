use clap::{ArgAction, ArgGroup, Parser, Subcommand};

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "gitscribe",
    version,
    about = "LLM-assisted drafts for commit messages, changelogs, and release notes"
)]
#[command(group(
    ArgGroup::new("model_group")
        .args(["model", "no_model"])
        .multiple(false)
))]
pub struct Cli {
    /// If set, write the generated message into .git/COMMIT_EDITMSG (no commit is created)
    #[arg(long, global = true)]
    pub apply: bool,

    /// Hook mode: never prompt, never fail the caller; print nothing on error
    #[arg(long, global = true)]
    pub hook: bool,

    /// Model name to use (e.g. gpt-5-nano). If 'none', acts like --no-model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Backend to use: openai or ollama
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Disable model calls; return dummy responses instead
    #[arg(long, global = true)]
    pub no_model: bool,

    /// API key (otherwise uses OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", global = true)]
    pub api_key: Option<String>,

    /// Optional free-text context about the change, passed into the prompt
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Output language for the generated text (e.g. German)
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Fixed token budget; overrides whatever the backend reports
    #[arg(long, global = true)]
    pub budget: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand (e.g. 'changelog')
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands, e.g. `gitscribe changelog main`
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draft a Markdown changelog section from the commits in base..from
    Changelog {
        /// Base branch or tag to compare against (e.g. main or v1.2.0)
        base: String,

        /// Optional feature/source branch; defaults to current branch if omitted
        from: Option<String>,
    },

    /// Draft user-facing release notes from the commits and diff in base..from
    ReleaseNotes {
        /// Base branch or tag to compare against (e.g. main or v1.2.0)
        base: String,

        /// Optional feature/source branch; defaults to current branch if omitted
        from: Option<String>,
    },
}
