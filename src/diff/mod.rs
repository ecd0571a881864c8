pub mod reduce;
pub mod segment;

pub use reduce::{reduce, ReducedDiff};
pub use segment::segment;

/// One changed file as reported by `git diff --name-status`.
#[derive(Debug, Clone)]
pub struct FileStatus {
    /// Current path of the file.
    pub path: String,
    /// Previous path, present only for renames.
    pub old_path: Option<String>,
    /// One-letter git status code (`A`, `M`, `D`, `R`, ...).
    pub code: char,
}

impl FileStatus {
    pub fn new(code: char, path: impl Into<String>) -> Self {
        FileStatus {
            path: path.into(),
            old_path: None,
            code,
        }
    }

    pub fn renamed(old_path: impl Into<String>, path: impl Into<String>) -> Self {
        FileStatus {
            path: path.into(),
            old_path: Some(old_path.into()),
            code: 'R',
        }
    }
}

/// What happened to a file. `SyntheticSummary` is never produced by the
/// segmenter; the reducer manufactures it to stand in for files it dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    SyntheticSummary,
}

impl ChangeStatus {
    fn from_code(code: char) -> Self {
        match code {
            'A' => ChangeStatus::Added,
            'D' => ChangeStatus::Deleted,
            'R' => ChangeStatus::Renamed,
            _ => ChangeStatus::Modified,
        }
    }
}

/// One file's slice of a larger diff, plus the metadata the prompt needs.
/// Value object: the reducer replaces `diff_text` when it truncates rather
/// than editing a chunk shared with anyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffChunk {
    pub path: String,
    pub old_path: Option<String>,
    pub status: ChangeStatus,
    pub diff_text: String,
    pub additions: usize,
    pub deletions: usize,
}

impl DiffChunk {
    /// `prefix path (+adds -dels)` one-liner used in file summaries.
    pub fn summary_entry(&self) -> String {
        let prefix = match self.status {
            ChangeStatus::Added => "new: ".to_string(),
            ChangeStatus::Deleted => "deleted: ".to_string(),
            ChangeStatus::Renamed => match &self.old_path {
                Some(old) => format!("renamed: {old} → "),
                None => "renamed: ".to_string(),
            },
            ChangeStatus::Modified | ChangeStatus::SyntheticSummary => String::new(),
        };
        format!(
            "{prefix}{path} (+{adds} -{dels})",
            path = self.path,
            adds = self.additions,
            dels = self.deletions
        )
    }
}
