// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod changelog;
pub mod completions;
pub mod config;
pub mod export;
pub mod list;
pub mod search;
pub mod show;
pub mod sync;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::loader;
use crate::types::ModuleWithMeta;
use owo_colors::OwoColorize;

/// State shared by every command of one invocation
pub struct Session {
    /// Effective configuration
    pub config: Config,
    /// Response cache for remote sources, one per process
    pub cache: ResponseCache,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
}

impl Session {
    /// Create a session; the cache persists under the configured cache dir
    #[must_use]
    pub fn new(config: Config, json: bool, color: bool) -> Self {
        let cache = ResponseCache::with_disk(config.cache_ttl(), config.cache_dir.join("http"));
        Self {
            config,
            cache,
            json,
            color,
        }
    }

    /// Load the merged catalog
    pub async fn catalog(&self) -> Vec<ModuleWithMeta> {
        loader::load_catalog(&self.config, &self.cache).await
    }

    pub(crate) fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub(crate) fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub(crate) fn accent(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }
}

/// One-line summary of a catalog entry
pub(crate) fn summary_line(session: &Session, entry: &ModuleWithMeta) -> String {
    let counts = crate::catalog::latest_version(&entry.module)
        .map(crate::catalog::VersionSummary::from)
        .unwrap_or_default();
    let category = entry
        .category
        .as_deref()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default();

    format!(
        "  {} {}{}  {}",
        session.heading(entry.name()),
        session.dim(&format!("({})", entry.source.as_str())),
        category,
        session.dim(&format!(
            "{} commands, {} hooks, {} cron jobs, {} permissions",
            counts.commands, counts.hooks, counts.cron_jobs, counts.permissions
        )),
    )
}

/// Print entries as text or JSON
pub(crate) fn print_entries(session: &Session, title: &str, entries: &[&ModuleWithMeta]) -> anyhow::Result<()> {
    if session.json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No modules found.");
        return Ok(());
    }

    println!("{} ({}):", title, entries.len());
    for entry in entries {
        println!("{}", summary_line(session, entry));
    }
    Ok(())
}
