// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Functional changelog derived from the git history of module files
//!
//! Extraction pulls before/after snapshots per commit, analysis turns each
//! pair into added/removed entities, aggregation groups the result.

pub mod aggregate;
pub mod analyze;
pub mod extract;
pub mod types;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use types::ChangelogArtifact;

/// Build the changelog artifact for the repository at `repo_path`
pub fn build(repo_path: &Path, modules_path: &str, generated_at: DateTime<Utc>) -> Result<ChangelogArtifact> {
    let records = extract::extract(repo_path, modules_path)?;
    Ok(aggregate::build(&records, generated_at))
}

/// Write an artifact as pretty JSON, creating parent directories
pub fn write(artifact: &ChangelogArtifact, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(artifact).context("Failed to serialize changelog")?;
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))
}
