use std::path::Path;
use std::process::Command;

/// Repository name for the document title: the basename of the origin
/// remote if one is configured, otherwise the directory's own name.
pub fn repo_name(root: &Path) -> String {
    if let Some(name) = remote_repo_name(root) {
        return name;
    }

    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("repository")
        .to_string()
}

pub fn remote_repo_name(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["config", "--get", "remote.origin.url"])
        .current_dir(root)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    name_from_remote_url(&url)
}

/// Last path segment of a remote URL with any `.git` suffix stripped.
/// Handles both https and scp-style ssh remotes.
fn name_from_remote_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.trim_end_matches(".git");

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
