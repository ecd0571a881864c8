use regex::Regex;
use std::collections::HashMap;

/// Lockfiles matched by exact filename, wherever they live.
const LOCKFILE_NAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "Gemfile.lock",
    "composer.lock",
    "poetry.lock",
    "Pipfile.lock",
    "go.sum",
    "mix.lock",
    "gradle.lockfile",
];

/// Build-output directories: a path anywhere under one of these is noise.
const BUILD_DIR_NAMES: &[&str] = &[
    "dist",
    "build",
    "out",
    "target",
    "node_modules",
    "vendor",
    ".next",
    ".nuxt",
    "coverage",
    "__pycache__",
];

/// Generated-artifact filename patterns, `*`/`?` glob syntax only.
const GENERATED_GLOBS: &[&str] = &["*.min.js", "*.min.css", "*.map", "*.generated.*", "*.snap"];

/// Decides whether a changed file is noise that should never reach a prompt:
/// lockfiles, build output, generated artifacts, plus any user-configured
/// patterns. Compiled glob matchers are memoized per pattern string so the
/// same handful of patterns can be checked against hundreds of paths cheaply.
pub struct IgnoreSet {
    glob_cache: HashMap<String, Regex>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        IgnoreSet {
            glob_cache: HashMap::new(),
        }
    }

    /// First match wins: lockfile name, build directory, generated-file glob,
    /// then the caller's extra patterns. No match means the file stays.
    pub fn should_ignore(&mut self, path: &str, extra_patterns: &[String]) -> bool {
        let filename = path.rsplit('/').next().unwrap_or(path);

        if LOCKFILE_NAMES.contains(&filename) {
            return true;
        }

        if BUILD_DIR_NAMES.iter().any(|dir| under_directory(path, dir)) {
            return true;
        }

        if GENERATED_GLOBS
            .iter()
            .any(|pattern| self.glob_match(pattern, filename))
        {
            return true;
        }

        for pattern in extra_patterns {
            if let Some(dir) = pattern.strip_suffix('/') {
                if under_directory(path, dir) {
                    return true;
                }
            } else if pattern.contains('*') {
                if self.glob_match(pattern, filename) {
                    return true;
                }
            } else if path == pattern.as_str() || filename == pattern.as_str() {
                return true;
            }
        }

        false
    }

    fn glob_match(&mut self, pattern: &str, candidate: &str) -> bool {
        let matcher = self
            .glob_cache
            .entry(pattern.to_string())
            .or_insert_with(|| compile_glob(pattern));
        matcher.is_match(candidate)
    }
}

fn under_directory(path: &str, dir: &str) -> bool {
    let prefix = format!("{dir}/");
    path.starts_with(&prefix) || path.contains(&format!("/{prefix}"))
}

/// Translate a `*`/`?` glob into an anchored regex: escape everything else,
/// substitute the two wildcards, compile once.
fn compile_glob(pattern: &str) -> Regex {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            _ => source.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    source.push('$');
    Regex::new(&source).expect("escaped glob compiles to a valid regex")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignored(path: &str) -> bool {
        IgnoreSet::new().should_ignore(path, &[])
    }

    #[test]
    fn lockfiles_ignored_anywhere() {
        assert!(ignored("package-lock.json"));
        assert!(ignored("frontend/package-lock.json"));
        assert!(ignored("deep/nested/dir/Cargo.lock"));
    }

    #[test]
    fn build_output_ignored() {
        assert!(ignored("dist/app.js"));
        assert!(ignored("packages/web/dist/app.js"));
        assert!(ignored("node_modules/lodash/index.js"));
    }

    #[test]
    fn generated_files_ignored() {
        assert!(ignored("assets/vendor.min.js"));
        assert!(ignored("src/app.js.map"));
        assert!(ignored("api/client.generated.ts"));
    }

    #[test]
    fn ordinary_source_kept() {
        assert!(!ignored("src/index.ts"));
        assert!(!ignored("src/main.rs"));
        assert!(!ignored("README.md"));
        // A directory merely *named like* a build dir prefix is not a match.
        assert!(!ignored("distribution/notes.md"));
    }

    #[test]
    fn extra_directory_pattern() {
        let mut set = IgnoreSet::new();
        let extra = vec!["docs/".to_string()];
        assert!(set.should_ignore("docs/guide.md", &extra));
        assert!(set.should_ignore("site/docs/guide.md", &extra));
        assert!(!set.should_ignore("src/docs.rs", &extra));
    }

    #[test]
    fn extra_glob_pattern() {
        let mut set = IgnoreSet::new();
        let extra = vec!["*.pb.go".to_string()];
        assert!(set.should_ignore("internal/api/service.pb.go", &extra));
        assert!(!set.should_ignore("internal/api/service.go", &extra));
    }

    #[test]
    fn extra_exact_pattern() {
        let mut set = IgnoreSet::new();
        let extra = vec!["CHANGELOG.md".to_string(), "src/generated.rs".to_string()];
        assert!(set.should_ignore("CHANGELOG.md", &extra));
        assert!(set.should_ignore("docs/CHANGELOG.md", &extra)); // filename match
        assert!(set.should_ignore("src/generated.rs", &extra)); // full-path match
        assert!(!set.should_ignore("src/lib.rs", &extra));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let mut set = IgnoreSet::new();
        let extra = vec!["snapshot-?.json".to_string()];
        assert!(set.should_ignore("snapshot-1.json", &extra));
        assert!(!set.should_ignore("snapshot-12.json", &extra));
    }

    #[test]
    fn glob_metacharacters_are_literal() {
        let mut set = IgnoreSet::new();
        let extra = vec!["*.(draft).md".to_string()];
        assert!(set.should_ignore("notes.(draft).md", &extra));
        assert!(!set.should_ignore("notesX(draft)Xmd", &extra));
    }
}
