use std::path::Path;

use crate::ignore::IgnoreSet;
use crate::tokens;

use super::{segment, ChangeStatus, DiffChunk, FileStatus};

/// Per-file diff bodies longer than this many lines are cut down to their
/// first `MAX_CHUNK_LINES` lines plus a trailer noting what was dropped.
pub const MAX_CHUNK_LINES: usize = 60;

/// Budgets below this are clamped up; the reducer never chases an
/// unworkably tiny target.
pub const MIN_TOKEN_BUDGET: usize = 500;

/// Extensions that mark a chunk as reviewable source code. Under overflow
/// these files are kept in preference to config, data, and documentation.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "py", "go", "java", "kt", "swift", "c", "h", "cpp",
    "hpp", "cc", "cs", "rb", "php", "scala", "sh", "sql", "vue", "svelte", "ex", "exs", "zig",
    "lua",
];

/// The output of one reduction pass: the chunks that will be rendered, in
/// render order, plus display totals and flags recording what was cut.
/// Built fresh on every call and handed straight to the prompt assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedDiff {
    pub chunks: Vec<DiffChunk>,
    pub summary_line: String,
    pub total_additions: usize,
    pub total_deletions: usize,
    pub was_filtered: bool,
    pub was_truncated: bool,
}

impl ReducedDiff {
    /// The degenerate no-changes result, also used as the placeholder when
    /// measuring prompt overhead.
    pub fn empty() -> Self {
        ReducedDiff {
            chunks: Vec::new(),
            summary_line: "No changes".to_string(),
            total_additions: 0,
            total_deletions: 0,
            was_filtered: false,
            was_truncated: false,
        }
    }
}

/// Filter, truncate, and summarize a raw diff until its serialized form fits
/// the token budget.
///
/// Noise files go first. If the remainder still overflows, chunks are
/// reordered source-first-then-smallest (render order intentionally diverges
/// from input order here), each body is capped at [`MAX_CHUNK_LINES`] lines,
/// and as a last resort non-source chunks are collapsed into a single
/// synthetic "Other files" listing. The function is total and deterministic:
/// same inputs, byte-identical output, no hidden state.
pub fn reduce(
    raw_diff: &str,
    statuses: &[FileStatus],
    extra_ignores: &[String],
    budget: usize,
) -> ReducedDiff {
    if raw_diff.trim().is_empty() {
        return ReducedDiff::empty();
    }

    let budget = budget.max(MIN_TOKEN_BUDGET);
    let mut ignores = IgnoreSet::new();

    let segmented = segment(raw_diff, statuses);
    let segmented_count = segmented.len();
    let mut chunks: Vec<DiffChunk> = segmented
        .into_iter()
        .filter(|chunk| !ignores.should_ignore(&chunk.path, extra_ignores))
        .collect();
    let was_filtered = chunks.len() < segmented_count;

    // Stable display totals: post-filter, pre-truncation.
    let total_additions = chunks.iter().map(|c| c.additions).sum();
    let total_deletions = chunks.iter().map(|c| c.deletions).sum();
    let retained_count = chunks.len();

    let mut was_truncated = false;
    if tokens::estimate(&serialize(&chunks)) > budget {
        was_truncated = true;

        // Maximize the number of reviewable files kept: source code first,
        // then smallest chunks first.
        chunks.sort_by_key(|c| (!is_source_file(&c.path), c.diff_text.len()));
        chunks = chunks.into_iter().map(cap_chunk).collect();

        if tokens::estimate(&serialize(&chunks)) > budget {
            let (source, other): (Vec<DiffChunk>, Vec<DiffChunk>) =
                chunks.into_iter().partition(|c| is_source_file(&c.path));

            if source.is_empty() {
                chunks = other;
            } else {
                chunks = source.into_iter().map(cap_chunk).collect();
                if !other.is_empty() {
                    chunks.push(synthetic_summary(&other));
                }
            }
        }
    }

    let summary_line = build_summary(retained_count, total_additions, total_deletions, &chunks);

    ReducedDiff {
        chunks,
        summary_line,
        total_additions,
        total_deletions,
        was_filtered,
        was_truncated,
    }
}

fn serialize(chunks: &[DiffChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.diff_text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_source_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Replace an over-long chunk with its first [`MAX_CHUNK_LINES`] lines plus a
/// trailer. Idempotent: an already-capped chunk passes through unchanged.
fn cap_chunk(chunk: DiffChunk) -> DiffChunk {
    let lines: Vec<&str> = chunk.diff_text.lines().collect();
    if lines.len() <= MAX_CHUNK_LINES {
        return chunk;
    }
    if lines.len() == MAX_CHUNK_LINES + 1 && lines[MAX_CHUNK_LINES].starts_with("... (truncated") {
        return chunk;
    }

    let omitted = lines.len() - MAX_CHUNK_LINES;
    let mut text = lines[..MAX_CHUNK_LINES].join("\n");
    text.push_str(&format!("\n... (truncated {omitted} more lines)"));

    DiffChunk {
        diff_text: text,
        ..chunk
    }
}

/// One manufactured chunk standing in for every dropped non-source file.
/// Its counts are the sums over those files, kept for accounting only.
fn synthetic_summary(dropped: &[DiffChunk]) -> DiffChunk {
    let mut text = String::from("Other files:");
    for chunk in dropped {
        text.push('\n');
        text.push_str(&chunk.summary_entry());
    }

    DiffChunk {
        path: "Other files".to_string(),
        old_path: None,
        status: ChangeStatus::SyntheticSummary,
        diff_text: text,
        additions: dropped.iter().map(|c| c.additions).sum(),
        deletions: dropped.iter().map(|c| c.deletions).sum(),
    }
}

fn build_summary(count: usize, additions: usize, deletions: usize, chunks: &[DiffChunk]) -> String {
    let mut summary = format!("{count} files changed, +{additions} -{deletions}");
    for chunk in chunks
        .iter()
        .filter(|c| c.status != ChangeStatus::SyntheticSummary)
    {
        summary.push('\n');
        summary.push_str(&chunk.summary_entry());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a per-file fragment with `lines` one-line additions.
    fn fragment(path: &str, lines: usize) -> String {
        let mut out = format!(
            "diff --git a/{path} b/{path}\nindex 1111111..2222222 100644\n--- a/{path}\n+++ b/{path}\n@@ -0,0 +1,{lines} @@\n"
        );
        for i in 0..lines {
            out.push_str(&format!("+filler line number {i} with some padding text\n"));
        }
        out
    }

    #[test]
    fn empty_diff_is_terminal() {
        let reduced = reduce("", &[], &[], 4000);
        assert!(reduced.chunks.is_empty());
        assert_eq!(reduced.summary_line, "No changes");
        assert!(!reduced.was_filtered);
        assert!(!reduced.was_truncated);

        let whitespace = reduce("   \n\n  ", &[], &[], 4000);
        assert_eq!(whitespace, ReducedDiff::empty());
    }

    #[test]
    fn under_budget_keeps_everything_verbatim() {
        let raw = fragment("src/main.rs", 10);
        let statuses = vec![FileStatus::new('M', "src/main.rs")];
        let reduced = reduce(&raw, &statuses, &[], 100_000);

        assert_eq!(reduced.chunks.len(), 1);
        assert!(!reduced.was_truncated);
        assert!(!reduced.was_filtered);
        assert!(reduced.chunks[0].diff_text.contains("filler line number 9"));
        assert_eq!(reduced.total_additions, 10);
    }

    #[test]
    fn ignored_files_are_filtered_out() {
        let raw = format!(
            "{}{}",
            fragment("src/main.rs", 5),
            fragment("package-lock.json", 200)
        );
        let statuses = vec![
            FileStatus::new('M', "src/main.rs"),
            FileStatus::new('M', "package-lock.json"),
        ];
        let reduced = reduce(&raw, &statuses, &[], 100_000);

        assert!(reduced.was_filtered);
        assert_eq!(reduced.chunks.len(), 1);
        assert_eq!(reduced.chunks[0].path, "src/main.rs");
        // Totals cover retained chunks only.
        assert_eq!(reduced.total_additions, 5);
    }

    #[test]
    fn overflow_caps_each_chunk_at_sixty_lines() {
        let raw = fragment("src/big.rs", 400);
        let statuses = vec![FileStatus::new('M', "src/big.rs")];
        let reduced = reduce(&raw, &statuses, &[], 600);

        assert!(reduced.was_truncated);
        let text = &reduced.chunks[0].diff_text;
        let line_count = text.lines().count();
        assert_eq!(line_count, MAX_CHUNK_LINES + 1);
        assert!(text.ends_with("... (truncated 345 more lines)"));
    }

    #[test]
    fn cap_is_idempotent() {
        let raw = fragment("src/big.rs", 400);
        let statuses = vec![FileStatus::new('M', "src/big.rs")];
        let once = reduce(&raw, &statuses, &[], 600);
        let capped = once.chunks[0].clone();
        assert_eq!(cap_chunk(capped.clone()), capped);
    }

    #[test]
    fn source_files_survive_over_non_source() {
        let raw = format!(
            "{}{}",
            fragment("config/deploy.yaml", 500),
            fragment("src/service.ts", 500)
        );
        let statuses = vec![
            FileStatus::new('M', "config/deploy.yaml"),
            FileStatus::new('M', "src/service.ts"),
        ];
        let reduced = reduce(&raw, &statuses, &[], 600);

        assert!(reduced.was_truncated);
        let paths: Vec<&str> = reduced.chunks.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"src/service.ts"));
        // The yaml survives only inside the synthetic summary, never as a
        // full chunk of its own.
        assert!(!paths.contains(&"config/deploy.yaml"));
        let synthetic = reduced
            .chunks
            .iter()
            .find(|c| c.status == ChangeStatus::SyntheticSummary)
            .expect("synthetic summary chunk present");
        assert!(synthetic.diff_text.starts_with("Other files:"));
        assert!(synthetic.diff_text.contains("config/deploy.yaml (+500 -0)"));
    }

    #[test]
    fn overflow_reorders_source_first_then_smallest() {
        let raw = format!(
            "{}{}{}",
            fragment("notes.md", 30),
            fragment("src/big.rs", 200),
            fragment("src/small.rs", 10)
        );
        let statuses = vec![
            FileStatus::new('M', "notes.md"),
            FileStatus::new('M', "src/big.rs"),
            FileStatus::new('M', "src/small.rs"),
        ];
        // Over budget, but line-capping the big file alone resolves it, so
        // every file is retained in the new render order.
        let reduced = reduce(&raw, &statuses, &[], 2000);

        assert!(reduced.was_truncated);
        let paths: Vec<&str> = reduced.chunks.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/small.rs", "src/big.rs", "notes.md"]);
    }

    #[test]
    fn reduce_is_deterministic() {
        let raw = format!(
            "{}{}{}",
            fragment("src/a.rs", 120),
            fragment("assets/data.json", 300),
            fragment("src/b.rs", 40)
        );
        let statuses = vec![
            FileStatus::new('M', "src/a.rs"),
            FileStatus::new('A', "assets/data.json"),
            FileStatus::new('M', "src/b.rs"),
        ];
        let first = reduce(&raw, &statuses, &[], 800);
        let second = reduce(&raw, &statuses, &[], 800);
        assert_eq!(first, second);
    }

    #[test]
    fn tiny_budget_is_clamped_to_floor() {
        let raw = fragment("src/main.rs", 30);
        let statuses = vec![FileStatus::new('M', "src/main.rs")];
        // 30 short lines fit inside the 500-token floor, so a budget of 1
        // must not trigger truncation.
        let reduced = reduce(&raw, &statuses, &[], 1);
        assert!(!reduced.was_truncated);
    }

    #[test]
    fn summary_line_lists_retained_files_with_prefixes() {
        let raw = format!(
            "{}{}",
            fragment("src/new_file.rs", 3),
            fragment("src/feature.rs", 4)
        );
        let statuses = vec![
            FileStatus::new('A', "src/new_file.rs"),
            FileStatus::new('M', "src/feature.rs"),
        ];
        let reduced = reduce(&raw, &statuses, &[], 100_000);

        let mut lines = reduced.summary_line.lines();
        assert_eq!(lines.next(), Some("2 files changed, +7 -0"));
        assert_eq!(lines.next(), Some("new: src/new_file.rs (+3 -0)"));
        assert_eq!(lines.next(), Some("src/feature.rs (+4 -0)"));
    }

    #[test]
    fn rename_summary_entry_shows_old_path() {
        let raw = concat!(
            "diff --git a/src/before.rs b/src/after.rs\n",
            "similarity index 90%\n",
            "rename from src/before.rs\n",
            "rename to src/after.rs\n",
            "--- a/src/before.rs\n",
            "+++ b/src/after.rs\n",
            "@@ -1 +1 @@\n",
            "-old\n",
            "+new\n",
        );
        let statuses = vec![FileStatus::renamed("src/before.rs", "src/after.rs")];
        let reduced = reduce(raw, &statuses, &[], 100_000);
        assert!(reduced
            .summary_line
            .contains("renamed: src/before.rs → src/after.rs (+1 -1)"));
    }
}
