use crate::logger::Logger;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shape of the assistant API's reply. Field precedence for the textual
/// answer is fixed: `output` first, then `answer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub output: Option<String>,
    pub answer: Option<String>,
    pub files_to_update: Option<Vec<FileUpdateSpec>>,
}

impl ApiResponse {
    pub fn answer_text(&self) -> Option<&str> {
        self.output.as_deref().or(self.answer.as_deref())
    }
}

/// One whole-file replacement instruction. Fields default to empty so a
/// malformed element degrades to a skippable spec instead of failing the
/// surrounding array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdateSpec {
    #[serde(rename = "fileName", default)]
    pub file_name: String,
    #[serde(rename = "fileContent", default)]
    pub file_content: String,
}

/// Apply any file-change instructions carried by `response`, resolving
/// paths against `base`. Side effects only; problems are logged per file
/// and never escalate.
pub fn apply(response: &ApiResponse, base: &Path, logger: &Logger) {
    let specs = extract_specs(response, logger);
    if specs.is_empty() {
        return;
    }

    let mut written = 0;
    for spec in &specs {
        if spec.file_name.is_empty() || spec.file_content.is_empty() {
            logger.error("skipping file update with empty fileName or fileContent");
            continue;
        }

        let target = base.join(&spec.file_name);
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                logger.error(&format!("cannot create directories for {}: {}", spec.file_name, e));
                continue;
            }
        }

        match fs::write(&target, &spec.file_content) {
            Ok(()) => {
                logger.info(&format!("updated {}", spec.file_name));
                written += 1;
            }
            Err(e) => logger.error(&format!("cannot write {}: {}", spec.file_name, e)),
        }
    }

    logger.info(&format!("file updates complete: {} written", written));
}

/// Layered extraction, first match wins, sources are never merged:
/// 1. the explicit `filesToUpdate` field;
/// 2. the whole answer text parsed as a JSON array of specs;
/// 3. a brace-balanced array literal found inside surrounding prose.
/// Anything else is a debug-level note, not an error.
pub fn extract_specs(response: &ApiResponse, logger: &Logger) -> Vec<FileUpdateSpec> {
    if let Some(list) = &response.files_to_update {
        return list.clone();
    }

    let text = match response.answer_text() {
        Some(text) => text,
        None => {
            logger.debug("response carries no text to scan for file updates");
            return Vec::new();
        }
    };

    if let Ok(specs) = serde_json::from_str::<Vec<FileUpdateSpec>>(text.trim()) {
        return specs;
    }

    if let Some(specs) = find_update_array(text) {
        return specs;
    }

    logger.debug("response content is not a recognized file-update format");
    Vec::new()
}

/// Scan the text for a balanced `[...]` fragment that parses as a spec
/// array. Depth counting is string- and escape-aware, so braces inside
/// fileContent strings do not unbalance the scan. A spec-shaped literal
/// quoted as an example in prose is still picked up; that ambiguity is
/// inherent to scanning free text and is accepted.
fn find_update_array(text: &str) -> Option<Vec<FileUpdateSpec>> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;
        if let Some(end) = balanced_array_end(text, start) {
            let fragment = &text[start..=end];
            if fragment.contains("\"fileName\"") {
                if let Ok(specs) = serde_json::from_str::<Vec<FileUpdateSpec>>(fragment) {
                    return Some(specs);
                }
            }
        }
        search_from = start + 1;
    }
    None
}

/// Byte index of the `]` matching the `[` at `start`, or None if the
/// brackets never balance.
fn balanced_array_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        let i = start + i;

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return if c == ']' { Some(i) } else { None };
                }
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }

    None
}
