// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Turning extracted records into changelog entries and grouping them

use super::analyze::analyze;
use super::types::{ChangeRecord, ChangelogArtifact, ChangelogEntry};
use crate::types::Module;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Analyze one record. Returns None when the record has no usable `after`
/// side or the commit made no functional change.
#[must_use]
pub fn entry_from_record(record: &ChangeRecord) -> Option<ChangelogEntry> {
    let after: Module = match record.json_after.clone().map(serde_json::from_value) {
        Some(Ok(module)) => module,
        Some(Err(e)) => {
            debug!("Dropping {}@{}: not a module: {}", record.file_path, short(&record.commit_hash), e);
            return None;
        }
        None => {
            debug!("Dropping {}@{}: no content after commit", record.file_path, short(&record.commit_hash));
            return None;
        }
    };
    let before: Option<Module> = record
        .json_before
        .clone()
        .and_then(|v| serde_json::from_value(v).ok());

    let analysis = analyze(before.as_ref(), &after, &record.module_name);
    if !analysis.has_changes {
        return None;
    }

    Some(ChangelogEntry {
        module_name: record.module_name.clone(),
        category: record.category.clone(),
        date: record.commit_date,
        title: analysis.title,
        description: analysis.description,
        commit_hash: record.commit_hash.clone(),
        is_new: before.is_none(),
        details: analysis.details,
    })
}

fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

/// Newest first; commit hash then module name break ties
fn newest_first(a: &ChangelogEntry, b: &ChangelogEntry) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.commit_hash.cmp(&b.commit_hash))
        .then_with(|| a.module_name.cmp(&b.module_name))
}

/// Build the global and per-module views
#[must_use]
pub fn aggregate(mut entries: Vec<ChangelogEntry>, generated_at: DateTime<Utc>) -> ChangelogArtifact {
    entries.sort_by(newest_first);

    let mut by_module: BTreeMap<String, Vec<ChangelogEntry>> = BTreeMap::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for entry in &entries {
        if seen.insert((entry.module_name.clone(), entry.commit_hash.clone())) {
            by_module
                .entry(entry.module_name.clone())
                .or_default()
                .push(entry.clone());
        }
    }

    ChangelogArtifact {
        global: entries,
        by_module,
        generated_at,
    }
}

/// Analyze every record and aggregate the entries that carry changes
#[must_use]
pub fn build(records: &[ChangeRecord], generated_at: DateTime<Utc>) -> ChangelogArtifact {
    let entries = records.iter().filter_map(entry_from_record).collect();
    aggregate(entries, generated_at)
}
