// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Changelog command - builds the changelog artifact from git history

use super::Session;
use crate::changelog;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

/// Run the changelog command
pub fn run(session: &Session, repo: &Path, output: Option<PathBuf>, module: Option<&str>) -> Result<()> {
    let modules_path = &session.config.changelog.modules_path;
    info!("Building changelog from {} ({})", repo.display(), modules_path);

    let artifact = changelog::build(repo, modules_path, Utc::now())
        .with_context(|| format!("Failed to build changelog for {}", repo.display()))?;

    if let Some(name) = module {
        let entries = artifact
            .by_module
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or_default();

        if session.json {
            println!("{}", serde_json::to_string_pretty(entries)?);
            return Ok(());
        }
        if entries.is_empty() {
            println!("No changes recorded for {name}");
        }
        for entry in entries {
            println!(
                "{} {} {}",
                session.dim(&entry.date.format("%Y-%m-%d").to_string()),
                session.heading(&entry.title),
                session.dim(&entry.commit_hash[..entry.commit_hash.len().min(7)])
            );
            println!("    {}", entry.description);
        }
        return Ok(());
    }

    let output = output.unwrap_or_else(|| session.config.changelog.output.clone());
    changelog::write(&artifact, &output)?;
    println!(
        "Wrote {} changelog entries for {} modules to {}",
        artifact.global.len(),
        artifact.by_module.len(),
        output.display()
    );
    Ok(())
}
