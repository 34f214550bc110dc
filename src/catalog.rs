// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Module catalog: merging, normalization, lookup and export
//!
//! The catalog is the union of community and built-in modules, keyed by
//! module name. Community modules shadow built-ins of the same name.

use crate::types::{Module, ModuleSource, ModuleVersion, ModuleWithMeta};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Tag of the version that is always listed first
pub const LATEST_TAG: &str = "latest";

/// Merge both sources into one catalog sorted by name; community wins ties
#[must_use]
pub fn merge(community: Vec<ModuleWithMeta>, builtin: Vec<ModuleWithMeta>) -> Vec<ModuleWithMeta> {
    let mut by_name: BTreeMap<String, ModuleWithMeta> = BTreeMap::new();

    for entry in builtin.into_iter().chain(community) {
        by_name.insert(entry.module.name.clone(), entry);
    }

    normalize_modules(by_name.into_values().collect())
}

/// Normalize every module in a list
#[must_use]
pub fn normalize_modules(modules: Vec<ModuleWithMeta>) -> Vec<ModuleWithMeta> {
    modules
        .into_iter()
        .map(|mut entry| {
            entry.module = normalize_module(entry.module);
            entry
        })
        .collect()
}

/// Backfill defaults, drop duplicate tags and order the versions of a module
#[must_use]
pub fn normalize_module(mut module: Module) -> Module {
    let mut seen = HashSet::new();
    module.versions.retain(|v| seen.insert(v.tag.clone()));

    for version in &mut module.versions {
        normalize_version(version);
    }
    sort_versions(&mut module.versions);
    module
}

fn normalize_version(version: &mut ModuleVersion) {
    if version.config_schema.trim().is_empty() {
        version.config_schema = "{}".to_string();
    }
    if version.ui_schema.trim().is_empty() {
        version.ui_schema = "{}".to_string();
    }
}

/// Order versions: `latest` first, then tags descending by plain string comparison.
///
/// The comparison is not semver-aware, so `v10.0.0` sorts below `v2.0.0`.
pub fn sort_versions(versions: &mut [ModuleVersion]) {
    versions.sort_by(|a, b| {
        match (a.tag == LATEST_TAG, b.tag == LATEST_TAG) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.tag.cmp(&a.tag),
        }
    });
}

/// The `latest` version if present, otherwise the first one
#[must_use]
pub fn latest_version(module: &Module) -> Option<&ModuleVersion> {
    module
        .versions
        .iter()
        .find(|v| v.tag == LATEST_TAG)
        .or_else(|| module.versions.first())
}

/// A specific version by tag
#[must_use]
pub fn find_version<'m>(module: &'m Module, tag: &str) -> Option<&'m ModuleVersion> {
    module.versions.iter().find(|v| v.tag == tag)
}

/// Keys of a schema's `properties` object; unparsable schemas count as empty
pub(crate) fn schema_properties(schema: &str) -> BTreeSet<String> {
    serde_json::from_str::<serde_json::Value>(schema)
        .ok()
        .and_then(|v| {
            v.get("properties")
                .and_then(serde_json::Value::as_object)
                .map(|props| props.keys().cloned().collect())
        })
        .unwrap_or_default()
}

/// Find a module by name, exact match first, then case-insensitive
#[must_use]
pub fn find<'c>(catalog: &'c [ModuleWithMeta], name: &str) -> Option<&'c ModuleWithMeta> {
    catalog
        .iter()
        .find(|m| m.module.name == name)
        .or_else(|| {
            catalog
                .iter()
                .find(|m| m.module.name.eq_ignore_ascii_case(name))
        })
}

// =============================================================================
// Search / filter
// =============================================================================

/// Catalog filter; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct ModuleFilter {
    /// Free-text query, matched case-insensitively
    pub query: Option<String>,
    /// Restrict to one source
    pub source: Option<ModuleSource>,
    /// Restrict to one category
    pub category: Option<String>,
}

impl ModuleFilter {
    /// Does a module pass this filter?
    #[must_use]
    pub fn matches(&self, entry: &ModuleWithMeta) -> bool {
        if let Some(source) = self.source {
            if entry.source != source {
                return false;
            }
        }

        if let Some(category) = &self.category {
            let same = entry
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category));
            if !same {
                return false;
            }
        }

        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => matches_query(&entry.module, &query.to_lowercase()),
        }
    }

    /// Apply the filter to a catalog, preserving order
    #[must_use]
    pub fn apply<'c>(&self, catalog: &'c [ModuleWithMeta]) -> Vec<&'c ModuleWithMeta> {
        catalog.iter().filter(|m| self.matches(m)).collect()
    }
}

fn matches_query(module: &Module, query: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(query);

    if hit(&module.name) {
        return true;
    }

    module.versions.iter().any(|v| {
        hit(&v.description)
            || v.commands.iter().any(|c| hit(&c.name) || hit(&c.trigger))
            || v.hooks.iter().any(|h| hit(&h.name) || hit(&h.event_type))
            || v.cron_jobs.iter().any(|j| hit(&j.name))
            || v.permissions.iter().any(|p| hit(&p.permission))
    })
}

// =============================================================================
// Summaries and export
// =============================================================================

/// Entity counts for one version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    /// Number of commands
    pub commands: usize,
    /// Number of hooks
    pub hooks: usize,
    /// Number of cron jobs
    pub cron_jobs: usize,
    /// Number of functions
    pub functions: usize,
    /// Number of permissions
    pub permissions: usize,
}

impl From<&ModuleVersion> for VersionSummary {
    fn from(v: &ModuleVersion) -> Self {
        Self {
            commands: v.commands.len(),
            hooks: v.hooks.len(),
            cron_jobs: v.cron_jobs.len(),
            functions: v.functions.len(),
            permissions: v.permissions.len(),
        }
    }
}

/// Payload accepted by the dashboard import endpoint: the module name plus
/// the flattened fields of its latest version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPayload {
    /// Module name
    pub name: String,
    /// Latest version fields
    #[serde(flatten)]
    pub version: ModuleVersion,
}

/// Build the dashboard import payload for a module
#[must_use]
pub fn import_payload(module: &Module) -> Option<ImportPayload> {
    latest_version(module).map(|v| ImportPayload {
        name: module.name.clone(),
        version: v.clone(),
    })
}

/// Canonical pretty JSON for a module, suitable for re-import
pub fn export_module(module: &Module) -> serde_json::Result<String> {
    serde_json::to_string_pretty(module)
}
