use crate::git;
use crate::ignore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// File-backed settings. Every field is optional so a partial config
/// overrides only what it names.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    pub output: Option<String>,
    pub depth: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub api_url: Option<String>,
    pub model: Option<String>,
}

impl Config {
    pub fn merge(&mut self, other: Config) {
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.depth.is_some() {
            self.depth = other.depth;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
    }
}

/// Global config (~/.repodoc/config.toml) merged under the repo-local
/// .repodoc.toml; command-line flags override both later.
pub fn load_config(root: &Path) -> Config {
    let mut config = Config::default();

    if let Some(home_dir) = dirs::home_dir() {
        let global_path = home_dir.join(".repodoc").join("config.toml");
        if let Ok(content) = fs::read_to_string(global_path) {
            if let Ok(global_config) = toml::from_str::<Config>(&content) {
                config.merge(global_config);
            }
        }
    }

    let repo_path = root.join(".repodoc.toml");
    if let Ok(content) = fs::read_to_string(repo_path) {
        if let Ok(repo_config) = toml::from_str::<Config>(&content) {
            config.merge(repo_config);
        }
    }

    config
}

/// Settings for one run, immutable once resolved.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output: PathBuf,
    /// None means unbounded.
    pub max_depth: Option<usize>,
    pub include_contents: bool,
    pub query: Option<String>,
    pub debug: bool,
    pub timeout_ms: u64,
}

impl RunConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        root: &Path,
        config: &Config,
        output: Option<String>,
        depth: Option<usize>,
        include_contents: bool,
        query: Option<String>,
        debug: bool,
        timeout_ms: Option<u64>,
    ) -> RunConfig {
        let output = output
            .or_else(|| config.output.clone())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                ignore::artifact_dir(root).join(format!("{}.md", git::repo_name(root)))
            });

        RunConfig {
            output,
            max_depth: depth.or(config.depth),
            include_contents,
            query,
            debug,
            timeout_ms: timeout_ms
                .or(config.timeout_ms)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }
}
