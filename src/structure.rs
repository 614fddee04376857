use crate::document::{relative_path, within_depth};
use crate::ignore::IgnoreSet;
use crate::logger::Logger;
use std::fs;
use std::path::Path;

/// ASCII tree of the filtered directory structure, one entry per line.
///
/// Applies the same ignore rules, dot-directory skipping and depth budget
/// as the document body so the Structure section never disagrees with it.
/// Siblings appear in directory-listing order; the last sibling uses the
/// corner connector and drops the vertical bar from its subtree's prefix.
pub fn render(
    root: &Path,
    max_depth: Option<usize>,
    ignore: &IgnoreSet,
    logger: &Logger,
) -> String {
    let mut out = String::new();
    render_dir(root, root, 0, max_depth, ignore, logger, "", &mut out);
    out
}

struct Item {
    name: String,
    path: std::path::PathBuf,
    is_dir: bool,
}

fn render_dir(
    root: &Path,
    dir: &Path,
    depth: usize,
    max_depth: Option<usize>,
    ignore: &IgnoreSet,
    logger: &Logger,
    prefix: &str,
    out: &mut String,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            logger.error(&format!("cannot list {}: {}", dir.display(), e));
            return;
        }
    };

    // Collected up front so the last sibling is known; collection keeps
    // the listing order.
    let mut items = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let rel = relative_path(root, &path);
        if ignore.is_ignored(&rel) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = path.is_dir();
        if is_dir {
            if name.starts_with('.') {
                continue;
            }
            if !within_depth(depth + 1, max_depth) {
                continue;
            }
        }

        items.push(Item { name, path, is_dir });
    }

    let count = items.len();
    for (i, item) in items.into_iter().enumerate() {
        let last = i == count - 1;
        let connector = if last { "└── " } else { "├── " };
        let display = if item.is_dir {
            format!("{}/", item.name)
        } else {
            item.name
        };
        out.push_str(&format!("{}{}{}\n", prefix, connector, display));

        if item.is_dir {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_dir(
                root,
                &item.path,
                depth + 1,
                max_depth,
                ignore,
                logger,
                &child_prefix,
                out,
            );
        }
    }
}
