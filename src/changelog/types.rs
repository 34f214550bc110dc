// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Changelog data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// Present after, absent before
    Added,
    /// Present before, absent after
    Removed,
    /// Present on both sides with a different value
    Updated,
}

/// One functional change, tagged by entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ChangeDetail {
    /// Chat command
    Command {
        /// Added or removed
        action: ChangeAction,
        /// Command name
        name: String,
        /// Chat trigger
        trigger: String,
    },
    /// Event hook
    Hook {
        /// Added or removed
        action: ChangeAction,
        /// Hook name
        name: String,
        /// Triggering event
        event_type: String,
    },
    /// Scheduled job
    CronJob {
        /// Added or removed
        action: ChangeAction,
        /// Job name
        name: String,
        /// Cron expression
        temporal_value: String,
    },
    /// Helper function
    Function {
        /// Added or removed
        action: ChangeAction,
        /// Function name
        name: String,
    },
    /// Permission
    Permission {
        /// Added or removed
        action: ChangeAction,
        /// Dotted permission key
        name: String,
        /// Display name
        friendly_name: String,
    },
    /// Config schema property
    Config {
        /// Added or removed
        action: ChangeAction,
        /// Property key
        name: String,
    },
    /// Version tag
    Version {
        /// Always updated
        action: ChangeAction,
        /// New tag
        name: String,
        /// Previous tag, if there was one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        /// New tag
        to: String,
    },
}

impl ChangeDetail {
    /// Added, removed or updated
    #[must_use]
    pub fn action(&self) -> ChangeAction {
        match self {
            Self::Command { action, .. }
            | Self::Hook { action, .. }
            | Self::CronJob { action, .. }
            | Self::Function { action, .. }
            | Self::Permission { action, .. }
            | Self::Config { action, .. }
            | Self::Version { action, .. } => *action,
        }
    }

    /// Identity of the changed entity
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Command { name, .. }
            | Self::Hook { name, .. }
            | Self::CronJob { name, .. }
            | Self::Function { name, .. }
            | Self::Permission { name, .. }
            | Self::Config { name, .. }
            | Self::Version { name, .. } => name,
        }
    }

    /// The `type` tag as written to JSON
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Hook { .. } => "hook",
            Self::CronJob { .. } => "cronjob",
            Self::Function { .. } => "function",
            Self::Permission { .. } => "permission",
            Self::Config { .. } => "config",
            Self::Version { .. } => "version",
        }
    }
}

/// Result of comparing two snapshots of a module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// False when nothing functional changed
    pub has_changes: bool,
    /// Short headline
    pub title: String,
    /// Human readable summary
    pub description: String,
    /// Individual changes
    pub details: Vec<ChangeDetail>,
}

/// One (commit, module file) pair pulled from git history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Module name
    pub module_name: String,
    /// Category directory
    pub category: String,
    /// Full commit hash
    pub commit_hash: String,
    /// Commit time
    pub commit_date: DateTime<Utc>,
    /// Author name
    pub commit_author: String,
    /// Commit summary line
    pub commit_message: String,
    /// Path of the module file inside the repository
    pub file_path: String,
    /// Content before the commit (None if absent or unparsable)
    pub json_before: Option<serde_json::Value>,
    /// Content after the commit (None if deleted or unparsable)
    pub json_after: Option<serde_json::Value>,
}

/// A human readable summary of one commit's effect on one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogEntry {
    /// Module name
    pub module_name: String,
    /// Category directory
    pub category: String,
    /// Commit time
    pub date: DateTime<Utc>,
    /// Short headline
    pub title: String,
    /// Human readable summary
    pub description: String,
    /// Full commit hash
    pub commit_hash: String,
    /// True when the commit introduced the module
    pub is_new: bool,
    /// Individual changes
    pub details: Vec<ChangeDetail>,
}

/// The persisted changelog artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogArtifact {
    /// Every entry, newest first
    pub global: Vec<ChangelogEntry>,
    /// Entries per module, newest first, one per commit
    pub by_module: BTreeMap<String, Vec<ChangelogEntry>>,
    /// When the artifact was built
    pub generated_at: DateTime<Utc>,
}
