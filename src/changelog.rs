use crate::git::CommitEntry;

/// Render a commit range as the history block of a changelog or
/// release-notes prompt: one line per commit, oldest first, bodies indented
/// under their subject so the model can tell them apart.
pub fn render_history(entries: &[CommitEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let short = entry.hash.chars().take(7).collect::<String>();
        let pr_tag = entry
            .pr_number
            .map(|n| format!(" (PR #{n})"))
            .unwrap_or_default();
        out.push_str(&format!(
            "- {short}{pr_tag}: {title}\n",
            title = entry.title.trim()
        ));
        if !entry.body.trim().is_empty() {
            out.push_str("  ");
            out.push_str(&entry.body.trim().replace('\n', "\n  "));
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}
