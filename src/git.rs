use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::Command as GitCommand;

use crate::diff::FileStatus;

/// One commit in a changelog range, plus any detected PR number.
#[derive(Debug, Clone)]
pub struct CommitEntry {
    pub hash: String,
    pub title: String,
    pub body: String,
    pub pr_number: Option<u32>,
}

/// Run a git command and capture stdout as String.
pub fn git_output(args: &[&str]) -> Result<String> {
    let output = GitCommand::new("git")
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {:?}", args))?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {:?} exited with status {:?}",
            args,
            output.status.code()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Get the path to the Git directory (e.g. .git)
pub fn git_dir() -> Result<PathBuf> {
    let dir = git_output(&["rev-parse", "--git-dir"])?.trim().to_string();
    Ok(PathBuf::from(dir))
}

/// Write the commit message into .git/COMMIT_EDITMSG so the next `git commit`
/// will use it as the default message in the editor.
pub fn write_commit_editmsg(message: &str) -> Result<()> {
    let dir = git_dir()?;
    let path = dir.join("COMMIT_EDITMSG");
    fs::write(&path, message)
        .with_context(|| format!("failed to write commit message to {:?}", path))?;
    Ok(())
}

/// Get the current branch name.
pub fn current_branch() -> Result<String> {
    let name = git_output(&["rev-parse", "--abbrev-ref", "HEAD"])?
        .trim()
        .to_string();
    Ok(name)
}

/// Get the full staged diff. Configured ignore paths are pushed down as
/// `:(exclude)` pathspecs, a cheap pre-filter before the reducer sees the
/// text; the reducer re-checks every path anyway.
pub fn staged_diff(exclude: &[String]) -> Result<String> {
    let mut args: Vec<String> = vec!["diff".into(), "--cached".into()];
    if !exclude.is_empty() {
        args.push("--".into());
        args.push(".".into());
        for pattern in exclude {
            args.push(format!(":(exclude){}", pattern.trim_end_matches('/')));
        }
    }
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    git_output(&arg_refs)
}

/// Staged file statuses: path, old path for renames, one-letter code.
pub fn staged_status_list() -> Result<Vec<FileStatus>> {
    let output = git_output(&["diff", "--cached", "--name-status", "-M"])?;
    Ok(parse_name_status(&output))
}

/// Diff of everything `base..from` changed, for release notes.
pub fn range_diff(base: &str, from: &str) -> Result<String> {
    let range = format!("{base}...{from}");
    git_output(&["diff", &range])
}

/// File statuses over a `base..from` range.
pub fn range_status_list(base: &str, from: &str) -> Result<Vec<FileStatus>> {
    let range = format!("{base}...{from}");
    let output = git_output(&["diff", "--name-status", "-M", &range])?;
    Ok(parse_name_status(&output))
}

/// Parse `--name-status` output: one file per line, tab-separated, with a
/// similarity score glued onto rename/copy codes (`R100\told\tnew`).
fn parse_name_status(output: &str) -> Vec<FileStatus> {
    let mut statuses = Vec::new();
    for line in output.lines() {
        let mut fields = line.split('\t');
        let Some(code_field) = fields.next() else {
            continue;
        };
        let Some(code) = code_field.chars().next() else {
            continue;
        };
        let Some(first_path) = fields.next() else {
            continue;
        };

        let status = match code {
            'R' | 'C' => match fields.next() {
                Some(new_path) => FileStatus::renamed(first_path, new_path),
                None => continue,
            },
            _ => FileStatus::new(code, first_path),
        };
        statuses.push(status);
    }
    statuses
}

/// Find the first PR number in a string, based on '#123' pattern.
fn find_first_pr_number(text: &str) -> Option<u32> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        if bytes[i] == b'#' {
            let mut j = i + 1;
            let mut value: u32 = 0;
            let mut found_digit = false;

            while j < len {
                let b = bytes[j];
                if b.is_ascii_digit() {
                    found_digit = true;
                    value = value.saturating_mul(10).saturating_add((b - b'0') as u32);
                    j += 1;
                } else {
                    break;
                }
            }

            if found_digit {
                return Some(value);
            }
        }
        i += 1;
    }

    None
}

/// Collect commits between base..from as CommitEntry list, oldest first.
pub fn collect_range_commits(base: &str, from: &str) -> Result<Vec<CommitEntry>> {
    let range = format!("{base}..{from}");
    let log_output = git_output(&[
        "log",
        "--reverse",
        "--pretty=format:%H%n%s%n%b%n---END---",
        &range,
    ])?;

    if log_output.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut entries = Vec::new();

    for block in log_output.split("\n---END---") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let mut lines = block.lines();
        let hash = match lines.next() {
            Some(h) => h.trim().to_string(),
            None => continue,
        };
        let title = lines.next().unwrap_or("").trim().to_string();
        let body = lines.collect::<Vec<_>>().join("\n");

        let mut pr_number = find_first_pr_number(&title);
        if pr_number.is_none() {
            pr_number = find_first_pr_number(&body);
        }

        entries.push(CommitEntry {
            hash,
            title,
            body,
            pr_number,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_status_parses_plain_and_rename_lines() {
        let output = "M\tsrc/lib.rs\nA\tsrc/new.rs\nD\tsrc/gone.rs\nR095\tsrc/old.rs\tsrc/moved.rs\n";
        let statuses = parse_name_status(output);
        assert_eq!(statuses.len(), 4);

        assert_eq!(statuses[0].code, 'M');
        assert_eq!(statuses[0].path, "src/lib.rs");
        assert!(statuses[0].old_path.is_none());

        assert_eq!(statuses[3].code, 'R');
        assert_eq!(statuses[3].path, "src/moved.rs");
        assert_eq!(statuses[3].old_path.as_deref(), Some("src/old.rs"));
    }

    #[test]
    fn name_status_skips_malformed_lines() {
        let statuses = parse_name_status("\nM\nR100\tonly-one-path\n");
        assert!(statuses.is_empty());
    }

    #[test]
    fn pr_number_found_in_text() {
        assert_eq!(find_first_pr_number("Merge pull request #42 from x"), Some(42));
        assert_eq!(find_first_pr_number("fix thing (#7)"), Some(7));
        assert_eq!(find_first_pr_number("no number here"), None);
        assert_eq!(find_first_pr_number("hash # but no digits"), None);
    }
}
