use regex::Regex;

use crate::diff::{ChangeStatus, ReducedDiff};

use super::prompts;

/// Above this many all-new files, the full diff adds no signal over the file
/// list; typical for the first commit of a project.
const INITIAL_COMMIT_FILE_THRESHOLD: usize = 5;

pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Which kind of text the backend is being asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptKind {
    #[default]
    CommitMessage,
    Changelog,
    ReleaseNotes,
}

/// Everything contextual that flows into a prompt besides the diff itself.
/// Absent options simply omit their section; section order is fixed.
#[derive(Default)]
pub struct PromptContext<'a> {
    pub kind: PromptKind,
    pub language: Option<&'a str>,
    pub style_guide: Option<&'a str>,
    pub branch: Option<&'a str>,
    pub ticket_re: Option<&'a Regex>,
    /// Rendered commit history, for changelog and release-notes prompts.
    pub history: Option<&'a str>,
    /// Free-text note from the user about what the change is for.
    pub user_note: Option<&'a str>,
}

/// Render the diff portion of the user prompt from one reduction pass.
pub fn render_diff_section(diff: &ReducedDiff) -> String {
    if diff.chunks.is_empty() {
        return "No changes staged.".to_string();
    }

    let mut out = String::new();
    out.push_str(&diff.summary_line);
    if diff.was_filtered {
        out.push_str("\n(Some auto-generated/lock files were excluded)");
    }
    if diff.was_truncated {
        out.push_str("\n(Large diff was truncated to fit context window)");
    }

    let real: Vec<_> = diff
        .chunks
        .iter()
        .filter(|c| c.status != ChangeStatus::SyntheticSummary)
        .collect();
    let initial_commit = real.len() > INITIAL_COMMIT_FILE_THRESHOLD
        && real.iter().all(|c| c.status == ChangeStatus::Added);
    if initial_commit {
        out.push_str(
            "\n(Full diff omitted: every file is new, the file list above describes the change)",
        );
        return out;
    }

    out.push_str("\n\n---\n");
    for chunk in &diff.chunks {
        out.push_str(&chunk.diff_text);
        out.push('\n');
    }
    out
}

/// Assemble the final system/user prompt pair around a reduced diff.
pub fn build_prompt(diff: &ReducedDiff, ctx: &PromptContext) -> PromptPair {
    let mut system = match ctx.kind {
        PromptKind::CommitMessage => prompts::COMMIT_RULES.to_owned(),
        PromptKind::Changelog => prompts::CHANGELOG_RULES.to_owned(),
        PromptKind::ReleaseNotes => prompts::RELEASE_NOTES_RULES.to_owned(),
    };
    if let Some(lang) = ctx.language {
        system.push_str(&format!("\nWrite the response in {lang}."));
    }
    if let Some(style) = ctx.style_guide {
        system.push_str("\nProject style guide:\n");
        system.push_str(style);
    }

    let mut user = String::new();
    if let Some(branch) = ctx.branch {
        user.push_str(&format!("Branch: {branch}\n"));
        if let Some(ticket) = extract_ticket(branch, ctx.ticket_re) {
            user.push_str(&format!(
                "Reference the ticket {ticket} in the message where appropriate.\n"
            ));
        }
        user.push('\n');
    }
    if let Some(history) = ctx.history {
        user.push_str("Commit history (oldest first):\n");
        user.push_str(history);
        user.push_str("\n\n");
    }
    if let Some(note) = ctx.user_note {
        user.push_str(&format!("Context from the author: {note}\n\n"));
    }
    user.push_str("Changes:\n");
    user.push_str(&render_diff_section(diff));

    PromptPair { system, user }
}

fn extract_ticket(branch: &str, ticket_re: Option<&Regex>) -> Option<String> {
    let re = ticket_re?;
    let m = re.find(branch)?;
    Some(m.as_str().to_string())
}
