use crate::config::RunConfig;
use crate::git;
use crate::ignore::{self, IgnoreSet};
use crate::logger::Logger;
use crate::structure;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Files at or above this many lines are truncated.
pub const LINE_CEILING: usize = 500;
/// How many lines of a truncated file are kept.
pub const PREVIEW_LINES: usize = 30;

pub const IMAGE_PLACEHOLDER: &str = "[image file, content omitted]";
pub const UNREADABLE_PLACEHOLDER: &str = "[unable to read file]";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "bmp", "ico"];

lazy_static! {
    static ref LANGUAGE_TAGS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("rs", "rust");
        m.insert("py", "python");
        m.insert("js", "javascript");
        m.insert("jsx", "javascript");
        m.insert("ts", "typescript");
        m.insert("tsx", "typescript");
        m.insert("go", "go");
        m.insert("rb", "ruby");
        m.insert("java", "java");
        m.insert("c", "c");
        m.insert("h", "c");
        m.insert("cpp", "cpp");
        m.insert("hpp", "cpp");
        m.insert("cs", "csharp");
        m.insert("php", "php");
        m.insert("swift", "swift");
        m.insert("kt", "kotlin");
        m.insert("sh", "bash");
        m.insert("bash", "bash");
        m.insert("zsh", "bash");
        m.insert("fish", "fish");
        m.insert("html", "html");
        m.insert("css", "css");
        m.insert("scss", "scss");
        m.insert("sql", "sql");
        m.insert("json", "json");
        m.insert("yaml", "yaml");
        m.insert("yml", "yaml");
        m.insert("toml", "toml");
        m.insert("xml", "xml");
        m.insert("md", "markdown");
        m.insert("txt", "text");
        m.insert("dockerfile", "dockerfile");
        m
    };
}

/// Create the artifact directory and register it in the repo's ignore
/// file so a later run never documents its own output.
pub fn prepare_artifact_dir(root: &Path, logger: &Logger) -> io::Result<()> {
    fs::create_dir_all(ignore::artifact_dir(root))?;

    if let Err(e) = ignore::register_artifact_dir(root) {
        // Registration is best-effort; the artifact dir is also in the
        // default deny-list.
        logger.warn(&format!("could not update .gitignore: {}", e));
    }

    Ok(())
}

/// Walk the tree under `root` and write the markdown document to
/// `config.output` incrementally, then append the structure section and
/// a timestamp.
///
/// Entries are visited in the order the platform's directory listing
/// returns them. That order is the contract here, not alphabetical
/// sorting; tests assert membership rather than position.
pub fn assemble(
    root: &Path,
    config: &RunConfig,
    ignore: &IgnoreSet,
    logger: &Logger,
) -> io::Result<()> {
    if let Some(parent) = config.output.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(&config.output)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# {}\n", git::repo_name(root))?;
    walk(root, root, 0, config, ignore, logger, &mut out)?;

    let tree = structure::render(root, config.max_depth, ignore, logger);
    writeln!(out, "## Structure\n\n```\n{}```\n", tree)?;
    writeln!(
        out,
        "Timestamp: {}",
        chrono::Utc::now().format("%b %d %Y %I:%M:%S %p UTC")
    )?;

    out.flush()
}

fn walk(
    root: &Path,
    dir: &Path,
    depth: usize,
    config: &RunConfig,
    ignore: &IgnoreSet,
    logger: &Logger,
    out: &mut impl Write,
) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            // Unlistable subtree contributes nothing but never fails the run.
            logger.error(&format!("cannot list {}: {}", dir.display(), e));
            return Ok(());
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger.error(&format!("cannot read entry in {}: {}", dir.display(), e));
                continue;
            }
        };

        let path = entry.path();
        let rel = relative_path(root, &path);
        if ignore.is_ignored(&rel) {
            logger.debug(&format!("ignored: {}", rel));
            continue;
        }

        if path.is_dir() {
            let name = entry.file_name();
            // Dot-directories are skipped outright, not merely unheaded.
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            if within_depth(depth + 1, config.max_depth) {
                writeln!(out, "## {}\n", rel)?;
                walk(root, &path, depth + 1, config, ignore, logger, out)?;
            }
        } else {
            write_file_entry(&path, &rel, config, logger, out)?;
        }
    }

    Ok(())
}

/// Depth 0 is the repository root; a directory at `depth` is entered
/// while that depth stays within the configured budget. None = unbounded.
pub fn within_depth(depth: usize, max_depth: Option<usize>) -> bool {
    max_depth.map_or(true, |max| depth <= max)
}

fn write_file_entry(
    path: &Path,
    rel: &str,
    config: &RunConfig,
    logger: &Logger,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "### {}\n", rel)?;

    if !config.include_contents {
        return Ok(());
    }

    writeln!(out, "```{}", language_tag(path))?;

    if is_image(path) {
        // Never opened for reading.
        writeln!(out, "{}", IMAGE_PLACEHOLDER)?;
        writeln!(out, "```\n")?;
        return Ok(());
    }

    match read_text(path) {
        Some(content) => {
            let line_count = content.lines().count();
            if line_count >= LINE_CEILING {
                for line in content.lines().take(PREVIEW_LINES) {
                    writeln!(out, "{}", line)?;
                }
                writeln!(out, "```\n")?;
                writeln!(
                    out,
                    "[truncated: file exceeds {} lines, showing first {}]\n",
                    LINE_CEILING, PREVIEW_LINES
                )?;
            } else {
                out.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    writeln!(out)?;
                }
                writeln!(out, "```\n")?;
            }
        }
        None => {
            logger.error(&format!("cannot read {} as text", rel));
            writeln!(out, "{}", UNREADABLE_PLACEHOLDER)?;
            writeln!(out, "```\n")?;
        }
    }

    Ok(())
}

/// Root-relative, `/`-separated path, the form ignore rules match against.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn language_tag(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    LANGUAGE_TAGS.get(ext.as_str()).copied().unwrap_or("")
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

fn read_text(path: &Path) -> Option<String> {
    if !likely_text(path) {
        return None;
    }
    fs::read(path).ok().and_then(|b| String::from_utf8(b).ok())
}

fn likely_text(path: &Path) -> bool {
    let mime = mime_guess::from_path(path).first_or_text_plain();
    use mime_guess::mime;

    !matches!(mime.type_(), mime::VIDEO | mime::AUDIO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_config(output: PathBuf, max_depth: Option<usize>) -> RunConfig {
        RunConfig {
            output,
            max_depth,
            include_contents: true,
            query: None,
            debug: false,
            timeout_ms: 1000,
        }
    }

    fn assemble_to_string(root: &Path, max_depth: Option<usize>) -> String {
        let out = root.join(".repodoc").join("doc.md");
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        let config = test_config(out.clone(), max_depth);
        let ignore = IgnoreSet::load(root);
        let logger = Logger::new(false);
        assemble(root, &config, &ignore, &logger).unwrap();
        fs::read_to_string(out).unwrap()
    }

    #[test]
    fn test_language_tag() {
        assert_eq!(language_tag(Path::new("main.rs")), "rust");
        assert_eq!(language_tag(Path::new("a/b/app.TS")), "typescript");
        assert_eq!(language_tag(Path::new("noext")), "");
        assert_eq!(language_tag(Path::new("weird.zzz")), "");
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("logo.png")));
        assert!(is_image(Path::new("icon.ICO")));
        assert!(!is_image(Path::new("main.rs")));
        assert!(!is_image(Path::new("noext")));
    }

    #[test]
    fn test_small_file_verbatim() {
        let dir = tempdir().unwrap();
        let content = "fn main() {\n    println!(\"hi\");\n}\n";
        fs::write(dir.path().join("main.rs"), content).unwrap();

        let doc = assemble_to_string(dir.path(), None);

        assert!(doc.contains("### main.rs"));
        assert!(doc.contains("```rust"));
        assert!(doc.contains(content));
        assert!(!doc.contains("truncated"));
    }

    #[test]
    fn test_oversized_file_truncated() {
        let dir = tempdir().unwrap();
        let content: String = (0..600).map(|i| format!("line {}\n", i)).collect();
        fs::write(dir.path().join("big.txt"), &content).unwrap();

        let doc = assemble_to_string(dir.path(), None);

        assert!(doc.contains("line 0"));
        assert!(doc.contains(&format!("line {}", PREVIEW_LINES - 1)));
        assert!(!doc.contains(&format!("line {}\n", PREVIEW_LINES)));
        assert!(doc.contains("500"));
        assert!(doc.contains("[truncated"));
    }

    #[test]
    fn test_file_at_ceiling_truncated() {
        let dir = tempdir().unwrap();
        let content: String = (0..LINE_CEILING).map(|i| format!("row {}\n", i)).collect();
        fs::write(dir.path().join("edge.txt"), &content).unwrap();

        let doc = assemble_to_string(dir.path(), None);
        assert!(doc.contains("[truncated"));
    }

    #[test]
    fn test_image_placeholder() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let doc = assemble_to_string(dir.path(), None);

        assert!(doc.contains("### logo.png"));
        assert!(doc.contains(IMAGE_PLACEHOLDER));
    }

    #[test]
    fn test_non_utf8_file_placeholder() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("data.txt"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let doc = assemble_to_string(dir.path(), None);

        assert!(doc.contains("### data.txt"));
        assert!(doc.contains(UNREADABLE_PLACEHOLDER));
    }

    #[test]
    fn test_dot_directories_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden/secret.txt"), "boo").unwrap();
        fs::write(dir.path().join("visible.txt"), "ok").unwrap();

        let doc = assemble_to_string(dir.path(), None);

        assert!(!doc.contains(".hidden"));
        assert!(!doc.contains("secret"));
        assert!(doc.contains("visible.txt"));
    }

    #[test]
    fn test_ignored_paths_absent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/pkg.js"), "x").unwrap();
        fs::write(dir.path().join("debug.log"), "x").unwrap();
        fs::write(dir.path().join("LICENSE"), "MIT").unwrap();
        fs::write(dir.path().join("kept.txt"), "x").unwrap();

        let doc = assemble_to_string(dir.path(), None);

        assert!(!doc.contains("node_modules"));
        assert!(!doc.contains("debug.log"));
        assert!(!doc.contains("LICENSE"));
        assert!(doc.contains("kept.txt"));
    }

    #[test]
    fn test_depth_zero_root_files_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/child.txt"), "x").unwrap();

        let doc = assemble_to_string(dir.path(), Some(0));

        assert!(doc.contains("### top.txt"));
        assert!(!doc.contains("## sub"));
        assert!(!doc.contains("child.txt"));
    }

    #[test]
    fn test_depth_one_no_grandchildren() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), "x").unwrap();
        fs::create_dir_all(dir.path().join("sub/inner")).unwrap();
        fs::write(dir.path().join("sub/child.txt"), "x").unwrap();
        fs::write(dir.path().join("sub/inner/grandchild.txt"), "x").unwrap();

        let doc = assemble_to_string(dir.path(), Some(1));

        assert!(doc.contains("## sub"));
        assert!(doc.contains("### sub/child.txt"));
        assert!(!doc.contains("sub/inner"));
        assert!(!doc.contains("grandchild.txt"));
    }

    #[test]
    fn test_assembly_is_deterministic_modulo_timestamp() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "beta").unwrap();

        let strip = |doc: String| {
            doc.lines()
                .filter(|l| !l.starts_with("Timestamp:"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let first = strip(assemble_to_string(dir.path(), None));
        let second = strip(assemble_to_string(dir.path(), None));
        assert_eq!(first, second);
    }

    #[test]
    fn test_paths_only_listing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();

        let out = dir.path().join("doc.md");
        let mut config = test_config(out.clone(), None);
        config.include_contents = false;
        let ignore = IgnoreSet::load(dir.path());
        let logger = Logger::new(false);
        assemble(dir.path(), &config, &ignore, &logger).unwrap();

        let doc = fs::read_to_string(out).unwrap();
        assert!(doc.contains("### a.rs"));
        assert!(!doc.contains("fn a() {}"));
    }
}
