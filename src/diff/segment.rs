use regex::Regex;

use super::{ChangeStatus, DiffChunk, FileStatus};

/// Split a raw unified diff into one chunk per file.
///
/// Each fragment starts at a `diff --git` marker; the two paths come from that
/// header line, and status/rename information is joined in from the
/// `--name-status` list (falling back to the mode/rename markers inside the
/// fragment body when the list has no matching entry). Fragments with no
/// parseable header, such as binary-diff artifacts, are dropped silently.
/// Output order matches input order.
pub fn segment(raw_diff: &str, statuses: &[FileStatus]) -> Vec<DiffChunk> {
    let header_re = Regex::new(r"^diff --git a/(.*?) b/(.*)$").unwrap();

    let mut chunks = Vec::new();
    for fragment in split_file_fragments(raw_diff) {
        let header = fragment.lines().next().unwrap_or("");
        let Some(caps) = header_re.captures(header) else {
            continue;
        };
        let header_old = caps[1].to_string();
        let header_new = caps[2].to_string();

        let (additions, deletions) = count_changes(fragment);

        let entry = statuses.iter().find(|s| {
            s.path == header_new
                || s.path == header_old
                || s.old_path.as_deref() == Some(header_old.as_str())
        });

        let (status, old_path) = match entry {
            Some(s) => (ChangeStatus::from_code(s.code), s.old_path.clone()),
            None => detect_from_body(fragment, &header_old, &header_new),
        };

        chunks.push(DiffChunk {
            path: header_new,
            old_path,
            status,
            diff_text: fragment.trim_end_matches('\n').to_string(),
            additions,
            deletions,
        });
    }
    chunks
}

/// Byte ranges of the input, one per `diff --git` marker at line start.
fn split_file_fragments(raw: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        if line.starts_with("diff --git ") {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(raw.len());
            &raw[start..end]
        })
        .collect()
}

/// Count `+`/`-` content lines, excluding the `+++`/`---` file headers.
fn count_changes(fragment: &str) -> (usize, usize) {
    let mut additions = 0;
    let mut deletions = 0;
    for line in fragment.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            deletions += 1;
        }
    }
    (additions, deletions)
}

/// Status detection for fragments the `--name-status` list doesn't cover,
/// from the extended header lines git writes into the fragment itself.
fn detect_from_body(
    fragment: &str,
    header_old: &str,
    header_new: &str,
) -> (ChangeStatus, Option<String>) {
    for line in fragment.lines().take(8) {
        if line.starts_with("new file mode") {
            return (ChangeStatus::Added, None);
        }
        if line.starts_with("deleted file mode") {
            return (ChangeStatus::Deleted, None);
        }
        if line.starts_with("rename from") {
            return (ChangeStatus::Renamed, Some(header_old.to_string()));
        }
    }
    if header_old != header_new {
        return (ChangeStatus::Renamed, Some(header_old.to_string()));
    }
    (ChangeStatus::Modified, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_diff() -> String {
        concat!(
            "diff --git a/src/lib.rs b/src/lib.rs\n",
            "index 1111111..2222222 100644\n",
            "--- a/src/lib.rs\n",
            "+++ b/src/lib.rs\n",
            "@@ -1,3 +1,4 @@\n",
            " fn existing() {}\n",
            "+fn added() {}\n",
            "-fn removed() {}\n",
            "+fn replacement() {}\n",
            "diff --git a/README.md b/README.md\n",
            "index 3333333..4444444 100644\n",
            "--- a/README.md\n",
            "+++ b/README.md\n",
            "@@ -1 +1,2 @@\n",
            " # Title\n",
            "+New line\n",
        )
        .to_string()
    }

    #[test]
    fn one_chunk_per_file_in_input_order() {
        let statuses = vec![
            FileStatus::new('M', "src/lib.rs"),
            FileStatus::new('M', "README.md"),
        ];
        let chunks = segment(&sample_diff(), &statuses);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].path, "src/lib.rs");
        assert_eq!(chunks[1].path, "README.md");
    }

    #[test]
    fn counts_exclude_file_headers() {
        let statuses = vec![
            FileStatus::new('M', "src/lib.rs"),
            FileStatus::new('M', "README.md"),
        ];
        let chunks = segment(&sample_diff(), &statuses);
        assert_eq!(chunks[0].additions, 2);
        assert_eq!(chunks[0].deletions, 1);
        assert_eq!(chunks[1].additions, 1);
        assert_eq!(chunks[1].deletions, 0);
    }

    #[test]
    fn rename_status_attaches_old_path() {
        let raw = concat!(
            "diff --git a/src/old_name.rs b/src/new_name.rs\n",
            "similarity index 97%\n",
            "rename from src/old_name.rs\n",
            "rename to src/new_name.rs\n",
        );
        let statuses = vec![FileStatus::renamed("src/old_name.rs", "src/new_name.rs")];
        let chunks = segment(raw, &statuses);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].status, ChangeStatus::Renamed);
        assert_eq!(chunks[0].old_path.as_deref(), Some("src/old_name.rs"));
    }

    #[test]
    fn status_detected_from_body_without_list_entry() {
        let raw = concat!(
            "diff --git a/new.txt b/new.txt\n",
            "new file mode 100644\n",
            "--- /dev/null\n",
            "+++ b/new.txt\n",
            "@@ -0,0 +1 @@\n",
            "+hello\n",
        );
        let chunks = segment(raw, &[]);
        assert_eq!(chunks[0].status, ChangeStatus::Added);
    }

    #[test]
    fn headerless_fragment_is_dropped() {
        let raw = "not a diff at all\njust noise\n";
        assert!(segment(raw, &[]).is_empty());
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(segment("", &[]).is_empty());
    }
}
