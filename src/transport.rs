use crate::logger::Logger;
use crate::updater::{self, ApiResponse};
use colored::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.repodoc.dev/v1/query";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-instruct";

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// How much of an error body makes it into an error message.
const ERROR_BODY_LIMIT: usize = 200;

const PENDING_RESPONSE_FILE: &str = "pending-response.json";
const ANSWER_FILE: &str = "answer.md";

/// Opaque authentication collaborator. When present, its address
/// replaces the empty walletAddress placeholder in the request.
pub trait Identity {
    fn address(&self) -> String;
}

#[derive(Debug)]
pub enum TransportError {
    DocumentMissing(String),
    Auth(String),
    Http { status: u16, body: String },
    Exhausted,
    BadResponse(String),
    MissingContent,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::DocumentMissing(msg) => {
                write!(f, "document not accessible: {}", msg)
            }
            TransportError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            TransportError::Http { status, body } => {
                write!(f, "request failed with status {}: {}", status, body)
            }
            TransportError::Exhausted => write!(f, "all attempts failed"),
            TransportError::BadResponse(msg) => write!(f, "invalid response: {}", msg),
            TransportError::MissingContent => {
                write!(f, "response is missing content")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Classification of one HTTP status, independent of the retry loop so
/// each branch is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Success,
    /// 429; retried like any other retryable status, only logged apart.
    RateLimited,
    Retryable,
    AuthFailure,
    Fatal,
}

pub fn classify_status(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Success,
        401 => Disposition::AuthFailure,
        429 => Disposition::RateLimited,
        500 | 502 | 503 | 504 => Disposition::Retryable,
        _ => Disposition::Fatal,
    }
}

/// Outcome of a single attempt, as fed to the retry loop.
pub enum Attempt {
    Success(String),
    Retry(String),
    Fatal(TransportError),
}

/// Bounded retry loop with a fixed inter-attempt delay. A retryable
/// outcome on the final attempt exhausts the loop.
pub fn run_attempts<F>(
    max_attempts: u32,
    delay: Duration,
    logger: &Logger,
    mut attempt: F,
) -> Result<String, TransportError>
where
    F: FnMut(u32) -> Attempt,
{
    for n in 1..=max_attempts {
        match attempt(n) {
            Attempt::Success(body) => return Ok(body),
            Attempt::Fatal(err) => return Err(err),
            Attempt::Retry(reason) => {
                if n == max_attempts {
                    break;
                }
                logger.warn(&format!(
                    "attempt {}/{} failed: {}; retrying in {}s",
                    n,
                    max_attempts,
                    reason,
                    delay.as_secs()
                ));
                std::thread::sleep(delay);
            }
        }
    }

    Err(TransportError::Exhausted)
}

pub struct QueryTransport {
    api_url: String,
    model: String,
    timeout: Duration,
    retry_delay: Duration,
    max_attempts: u32,
    artifact_dir: PathBuf,
}

impl QueryTransport {
    pub fn new(api_url: String, model: String, timeout_ms: u64, artifact_dir: PathBuf) -> Self {
        QueryTransport {
            api_url,
            model,
            timeout: Duration::from_millis(timeout_ms),
            retry_delay: RETRY_DELAY,
            max_attempts: MAX_ATTEMPTS,
            artifact_dir,
        }
    }

    /// Send the assembled document plus `query` to the assistant API.
    ///
    /// Always returns a printable string; every failure mode is folded
    /// into a human-readable message rather than propagated.
    pub fn send_query(
        &self,
        query: &str,
        document: &Path,
        identity: Option<&dyn Identity>,
        logger: &Logger,
    ) -> String {
        match self.try_send(query, document, identity, logger) {
            Ok(answer) => answer,
            Err(e) => format!("{} {}", "Query failed:".red().bold(), e),
        }
    }

    fn try_send(
        &self,
        query: &str,
        document: &Path,
        identity: Option<&dyn Identity>,
        logger: &Logger,
    ) -> Result<String, TransportError> {
        // VALIDATE: no retries for a missing document.
        if !document.is_file() {
            return Err(TransportError::DocumentMissing(format!(
                "{} does not exist",
                document.display()
            )));
        }
        let doc_bytes = fs::read(document)
            .map_err(|e| TransportError::DocumentMissing(e.to_string()))?;
        let doc_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.md".to_string());

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::BadResponse(e.to_string()))?;

        let wallet = identity.map(|id| id.address()).unwrap_or_default();

        logger.debug(&format!(
            "sending query to {} (model {}, document {} bytes)",
            self.api_url,
            self.model,
            doc_bytes.len()
        ));

        let body = run_attempts(self.max_attempts, self.retry_delay, logger, |n| {
            logger.debug(&format!("attempt {}/{}", n, self.max_attempts));
            self.attempt(&client, query, &wallet, &doc_bytes, &doc_name, logger)
        })?;

        // Raw body first, so a parse failure still leaves an audit trail.
        let pending = self.artifact_dir.join(PENDING_RESPONSE_FILE);
        if let Err(e) = fs::write(&pending, &body) {
            logger.error(&format!("cannot save raw response: {}", e));
        }

        let response: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::BadResponse(e.to_string()))?;

        let answer = response
            .answer_text()
            .ok_or(TransportError::MissingContent)?
            .to_string();

        let target = unique_filename(&self.artifact_dir.join(ANSWER_FILE));
        match fs::write(&target, &answer) {
            Ok(()) => logger.info(&format!("answer saved to {}", target.display())),
            Err(e) => logger.error(&format!("cannot save answer: {}", e)),
        }

        // File updates run regardless of whether the answer text is empty.
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        updater::apply(&response, &base, logger);

        Ok(format_answer(&answer))
    }

    fn attempt(
        &self,
        client: &reqwest::blocking::Client,
        query: &str,
        wallet: &str,
        doc_bytes: &[u8],
        doc_name: &str,
        logger: &Logger,
    ) -> Attempt {
        // Multipart forms are single-use; rebuild per attempt.
        let part = match reqwest::blocking::multipart::Part::bytes(doc_bytes.to_vec())
            .file_name(doc_name.to_string())
            .mime_str("text/markdown")
        {
            Ok(part) => part,
            Err(e) => return Attempt::Fatal(TransportError::BadResponse(e.to_string())),
        };
        let form = reqwest::blocking::multipart::Form::new()
            .text("message", query.to_string())
            .text("model", self.model.clone())
            .text("sessionId", String::new())
            .text("walletAddress", wallet.to_string())
            .text("context", String::new())
            .part("file", part);

        let result = client.post(&self.api_url).multipart(form).send();
        let response = match result {
            Ok(response) => response,
            // Network and timeout failures; the loop decides whether this
            // was the last permitted attempt.
            Err(e) => return Attempt::Retry(format!("network error: {}", e)),
        };

        let status = response.status().as_u16();
        match classify_status(status) {
            Disposition::Success => match response.text() {
                Ok(body) => Attempt::Success(body),
                Err(e) => Attempt::Retry(format!("cannot read response body: {}", e)),
            },
            Disposition::AuthFailure => {
                let detail = error_detail(response);
                Attempt::Fatal(TransportError::Auth(detail))
            }
            Disposition::RateLimited => {
                logger.warn("rate limited by the API (429)");
                Attempt::Retry("rate limited".to_string())
            }
            Disposition::Retryable => Attempt::Retry(format!("server error {}", status)),
            Disposition::Fatal => {
                let body = error_detail(response);
                Attempt::Fatal(TransportError::Http { status, body })
            }
        }
    }
}

/// Pull a short error description out of a non-2xx body, which carries
/// either JSON with a message/error field or plain text.
fn error_detail(response: reqwest::blocking::Response) -> String {
    let body = response.text().unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or(body);

    truncate_chars(&detail, ERROR_BODY_LIMIT)
}

fn truncate_chars(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let cut: String = s.chars().take(limit).collect();
        format!("{}...", cut)
    }
}

/// Collision-avoided file name: unchanged if free, else `name(1).md`,
/// `name(2).md`, ... Existence probing only; two concurrent runs against
/// the same directory can still race.
pub fn unique_filename(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut n = 1;
    loop {
        let candidate = parent.join(format!("{}({}){}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Cosmetic reformatting of the answer for the terminal: colorized
/// headings, indented code blocks, bullet glyphs. Nothing here is
/// semantically load-bearing; the saved answer file keeps the raw text.
pub fn format_answer(answer: &str) -> String {
    let mut out = String::new();
    let mut in_code = false;

    for line in answer.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }

        if in_code {
            out.push_str("    ");
            out.push_str(line);
        } else if line.starts_with('#') {
            let heading = line.trim_start_matches('#').trim_start();
            out.push_str(&heading.cyan().bold().to_string());
        } else if let Some(rest) = line.strip_prefix("- ") {
            out.push_str(&format!("  • {}", rest));
        } else if let Some(rest) = line.strip_prefix("* ") {
            out.push_str(&format!("  • {}", rest));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}
