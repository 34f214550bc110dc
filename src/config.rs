// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest priority first: built-in defaults, an optional TOML file,
//! then `TAKARO_MODULES_*` environment variables (`__` separates nested keys,
//! e.g. `TAKARO_MODULES_CHANGELOG__OUTPUT`).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TAKARO_MODULES";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding community module JSON files
    pub modules_dir: PathBuf,
    /// Glob patterns (relative to `modules_dir`) selecting module files
    pub module_patterns: Vec<String>,
    /// Directory for cached remote responses
    pub cache_dir: PathBuf,
    /// Lifetime of cached remote responses, in seconds
    pub cache_ttl_secs: u64,
    /// Token for the GitHub API (falls back to `GITHUB_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// GitHub API root (override for GitHub Enterprise)
    pub github_api_root: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Where built-in modules come from
    pub builtin: BuiltinSource,
    /// Changelog build settings
    pub changelog: ChangelogConfig,
}

/// Source of built-in module definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BuiltinSource {
    /// Pre-generated JSON feed on disk
    Feed {
        /// Feed file path
        path: PathBuf,
    },
    /// Directory of module JSON files in a GitHub repository
    Github {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
        /// Directory inside the repository
        path: String,
        /// Branch, tag or commit
        git_ref: String,
    },
    /// No built-in modules
    None,
}

impl Default for BuiltinSource {
    fn default() -> Self {
        Self::Github {
            owner: "gettakaro".to_string(),
            repo: "takaro".to_string(),
            path: "packages/lib-modules/json".to_string(),
            git_ref: "main".to_string(),
        }
    }
}

/// Changelog build settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Path of the modules directory inside the git repository
    pub modules_path: String,
    /// Artifact output file
    pub output: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            modules_path: "modules".to_string(),
            output: PathBuf::from("changelog.json"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from("modules"),
            module_patterns: vec!["**/*.json".to_string()],
            cache_dir: project_dirs()
                .map(|d| d.cache_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".cache/takaro-modules")),
            cache_ttl_secs: 300,
            github_token: None,
            github_api_root: crate::github::API_ROOT.to_string(),
            builtin: BuiltinSource::default(),
            log_level: "info".to_string(),
            changelog: ChangelogConfig::default(),
        }
    }
}

impl Config {
    /// Cache lifetime as a `Duration`
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Configured token, or `GITHUB_TOKEN` from the environment
    #[must_use]
    pub fn github_token(&self) -> Option<String> {
        self.github_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    /// Look up a dotted key (e.g. `changelog.output`) in the effective configuration
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut value = serde_json::to_value(self).ok()?;
        for part in key.split('.') {
            value = value.get(part)?.clone();
        }
        Some(value)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("gg", "takaro", "takaro-modules")
}

/// Default location of the configuration file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from defaults, an optional file and the environment
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut builder = ::config::Config::builder()
        .add_source(::config::Config::try_from(&Config::default())?);

    match path {
        Some(p) => {
            builder = builder.add_source(::config::File::from(p.to_path_buf()).required(true));
        }
        None => {
            if let Some(p) = default_path() {
                builder = builder.add_source(::config::File::from(p).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}
