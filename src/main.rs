mod changelog;
mod cli_args;
mod config;
mod diff;
mod git;
mod ignore;
mod llm;
mod logging;
mod setup;
mod tokens;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use indicatif::ProgressBar;
use regex::Regex;
use std::time::Duration;

use cli_args::{Cli, Command};
use config::{Config, Provider};
use llm::prompt_builder::{PromptContext, PromptKind};
use llm::retry::{generate_with_retry, GenerationRequest};
use llm::LlmClient;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let cfg = Config::from_sources(&cli);
    let client = setup::build_llm_client(&cfg)?;

    let result = match &cli.command {
        Some(Command::Changelog { base, from }) => run_range(
            &cfg,
            client.as_ref(),
            PromptKind::Changelog,
            base,
            from.as_deref(),
        ),
        Some(Command::ReleaseNotes { base, from }) => run_range(
            &cfg,
            client.as_ref(),
            PromptKind::ReleaseNotes,
            base,
            from.as_deref(),
        ),
        None => run_commit(&cli, &cfg, client.as_ref()),
    };

    // Hook mode must never break the calling workflow: swallow the failure
    // and leave whatever message the user already had untouched.
    if cli.hook {
        if let Err(err) = result {
            log::warn!("generation failed, leaving commit message untouched: {err:#}");
        }
        return Ok(());
    }

    result
}

/// Default command: draft a commit message for the staged diff.
fn run_commit(cli: &Cli, cfg: &Config, client: &dyn LlmClient) -> Result<()> {
    let branch = git::current_branch()?;
    let raw_diff = git::staged_diff(&cfg.ignore_paths)?;

    if raw_diff.trim().is_empty() {
        println!("No staged changes found.");
        return Ok(());
    }

    let statuses = git::staged_status_list()?;
    let ticket_re = compile_ticket_pattern(&cfg.ticket_pattern);

    loop {
        let prompt = PromptContext {
            kind: PromptKind::CommitMessage,
            language: cfg.language.as_deref(),
            style_guide: cfg.style_guide.as_deref(),
            branch: Some(&branch),
            ticket_re: ticket_re.as_ref(),
            history: None,
            user_note: cli.context.as_deref(),
        };
        let message = generate(cfg, client, &raw_diff, &statuses, prompt)
            .context("failed to generate commit message")?;

        print_preview("Commit Message", &message);

        if cli.hook {
            git::write_commit_editmsg(&message)?;
            return Ok(());
        }

        match prompt_action()? {
            Action::Accept => {
                if cli.apply {
                    git::write_commit_editmsg(&message)?;
                    println!("Wrote message to .git/COMMIT_EDITMSG");
                }
                return Ok(());
            }
            Action::Regenerate => continue,
            Action::Quit => return Ok(()),
        }
    }
}

/// Changelog / release notes over base..from.
fn run_range(
    cfg: &Config,
    client: &dyn LlmClient,
    kind: PromptKind,
    base: &str,
    from_opt: Option<&str>,
) -> Result<()> {
    let from = match from_opt {
        Some(name) => name.to_string(),
        None => git::current_branch()?,
    };

    let entries = git::collect_range_commits(base, &from)?;
    if entries.is_empty() {
        println!("No commits found between {base} and {from}.");
        return Ok(());
    }

    let history = changelog::render_history(&entries);
    let raw_diff = git::range_diff(base, &from)?;
    let statuses = git::range_status_list(base, &from)?;

    let prompt = PromptContext {
        kind,
        language: cfg.language.as_deref(),
        style_guide: cfg.style_guide.as_deref(),
        branch: None,
        ticket_re: None,
        history: Some(&history),
        user_note: None,
    };

    let label = match kind {
        PromptKind::Changelog => "Changelog",
        _ => "Release Notes",
    };
    let message = generate(cfg, client, &raw_diff, &statuses, prompt)
        .with_context(|| format!("failed to generate {}", label.to_lowercase()))?;

    print_preview(label, &message);
    Ok(())
}

/// One full generation through the reduce/assemble/retry pipeline.
fn generate(
    cfg: &Config,
    client: &dyn LlmClient,
    raw_diff: &str,
    statuses: &[diff::FileStatus],
    prompt: PromptContext,
) -> Result<String> {
    let provider_budget = cfg.token_budget.unwrap_or_else(|| client.token_budget());
    log::debug!("provider budget: {provider_budget} tokens");

    let req = GenerationRequest {
        raw_diff,
        statuses,
        ignore_patterns: &cfg.ignore_paths,
        prompt,
        provider_budget,
    };

    // Streaming backends narrate their own progress; everything else gets a
    // spinner so the terminal doesn't look hung.
    let spinner = if cfg.stream && cfg.provider != Provider::None {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_message("Talking to the model...");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let result = generate_with_retry(client, &req);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    Ok(result?)
}

fn compile_ticket_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            log::warn!("invalid ticket_pattern {pattern:?}: {err}");
            None
        }
    }
}

fn print_preview(label: &str, message: &str) {
    println!();
    println!("{}", format!("----- {label} Preview -----").bright_black());
    println!("{message}");
    println!("{}", "---------------------------".bright_black());
}

enum Action {
    Accept,
    Regenerate,
    Quit,
}

/// Single-keypress accept/regenerate/quit prompt.
fn prompt_action() -> Result<Action> {
    println!("{}", "[a]ccept  [r]egenerate  [q]uit".bright_black());

    terminal::enable_raw_mode()?;
    let action = read_action();
    terminal::disable_raw_mode()?;
    action
}

fn read_action() -> Result<Action> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('a') | KeyCode::Enter => return Ok(Action::Accept),
                KeyCode::Char('r') => return Ok(Action::Regenerate),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(Action::Quit),
                _ => {}
            }
        }
    }
}
