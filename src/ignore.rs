use glob::Pattern;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Artifact directory for the assembled document, the raw response dump
/// and saved answers. Always ignored during traversal.
pub const ARTIFACT_DIR: &str = ".repodoc";

const IGNORE_FILE: &str = ".gitignore";

/// Directories excluded by default, before any repo-level rules.
const DEFAULT_IGNORES: &[&str] = &[".git", "node_modules", "dist", ARTIFACT_DIR];

/// Named items excluded regardless of ignore rules.
const ALWAYS_EXCLUDED: &[&str] = &["LICENSE", ".git"];

/// Combined ignore ruleset: fixed defaults plus the repository's
/// `.gitignore`, evaluated against paths relative to the repo root.
/// A match excludes; there is no re-inclusion negation.
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn load(root: &Path) -> Self {
        let mut patterns = Vec::new();

        for name in DEFAULT_IGNORES {
            append_patterns(name, &mut patterns);
        }

        // Missing or unreadable ignore file is fine, defaults still apply.
        if let Ok(content) = fs::read_to_string(root.join(IGNORE_FILE)) {
            patterns.extend(parse_lines(&content));
        }

        IgnoreSet { patterns }
    }

    /// `rel_path` must be relative to the repo root and `/`-separated,
    /// regardless of which directory the walk is currently visiting.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let excluded = rel_path
            .split('/')
            .any(|part| ALWAYS_EXCLUDED.contains(&part));
        if excluded {
            return true;
        }

        self.patterns.iter().any(|p| p.matches(rel_path))
    }

    #[cfg(test)]
    fn from_lines(lines: &str) -> Self {
        IgnoreSet {
            patterns: parse_lines(lines),
        }
    }
}

fn parse_lines(content: &str) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        append_patterns(line, &mut patterns);
    }
    patterns
}

/// Translate one ignore line into globs that behave like the equivalent
/// gitignore pattern when matched against root-relative paths. A
/// directory pattern yields two globs: one for the directory itself (so
/// the walk prunes it) and one for everything beneath it.
fn append_patterns(line: &str, out: &mut Vec<Pattern>) {
    let mut push = |pattern: String| {
        if let Ok(p) = Pattern::new(&pattern) {
            out.push(p);
        }
    };

    // A leading slash anchors the pattern at the repo root.
    if let Some(anchored) = line.strip_prefix('/') {
        if let Some(stem) = anchored.strip_suffix('/') {
            push(stem.to_string());
            push(format!("{}/**", stem));
        } else {
            push(anchored.to_string());
        }
        return;
    }

    if line.starts_with("**/") {
        push(line.to_string());
    } else if let Some(stem) = line.strip_suffix('/') {
        push(format!("**/{}", stem));
        push(format!("**/{}/**", stem));
    } else if line.contains('/') {
        push(line.to_string());
    } else {
        // A bare name matches at any depth, directory or file.
        push(format!("**/{}", line));
        push(format!("**/{}/**", line));
    }
}

pub fn artifact_dir(root: &Path) -> PathBuf {
    root.join(ARTIFACT_DIR)
}

/// Append the artifact directory to the repo's `.gitignore` so generated
/// documents never end up in later documents. Idempotent: a pattern
/// already present is never duplicated; the file is created if absent.
pub fn register_artifact_dir(root: &Path) -> std::io::Result<()> {
    let entry = format!("{}/", ARTIFACT_DIR);
    let path = root.join(IGNORE_FILE);

    let existing = fs::read_to_string(&path).unwrap_or_default();
    let present = existing
        .lines()
        .any(|line| line.trim() == entry || line.trim() == ARTIFACT_DIR);
    if present {
        return Ok(());
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{}", entry)?;

    Ok(())
}
