// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Takaro modules library - catalog and changelog tooling for game-server modules
//!
//! This crate loads community and built-in Takaro modules, merges them into a
//! single normalized catalog, and derives a functional changelog from the git
//! history of the community module files.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod catalog;
pub mod changelog;
pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod loader;

pub use error::{Error, Result};

/// Core module data types as found in module JSON files
pub mod types {
    use serde::{Deserialize, Deserializer, Serialize};
    use std::path::PathBuf;

    // =========================================================================
    // Module
    // =========================================================================

    /// A Takaro module: a named package of commands, hooks, cron jobs and permissions
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Module {
        /// Unique module name
        pub name: String,
        /// Takaro version the module was exported from
        #[serde(default)]
        pub takaro_version: String,
        /// Released versions of this module
        #[serde(default)]
        pub versions: Vec<ModuleVersion>,
    }

    /// One tagged version of a module
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ModuleVersion {
        /// Version tag ("latest", "1.0.0", ...)
        #[serde(default, deserialize_with = "null_as_default")]
        pub tag: String,
        /// Human readable description
        #[serde(default, deserialize_with = "null_as_default")]
        pub description: String,
        /// JSON-encoded configuration schema
        #[serde(default = "empty_schema", deserialize_with = "schema_string")]
        pub config_schema: String,
        /// JSON-encoded UI schema
        #[serde(default = "empty_schema", deserialize_with = "schema_string")]
        pub ui_schema: String,
        /// Chat commands
        #[serde(default, deserialize_with = "null_as_default")]
        pub commands: Vec<Command>,
        /// Event hooks
        #[serde(default, deserialize_with = "null_as_default")]
        pub hooks: Vec<Hook>,
        /// Scheduled jobs
        #[serde(default, deserialize_with = "null_as_default")]
        pub cron_jobs: Vec<CronJob>,
        /// Shared helper functions
        #[serde(default, deserialize_with = "null_as_default")]
        pub functions: Vec<Function>,
        /// Permissions exposed by the module
        #[serde(default, deserialize_with = "null_as_default")]
        pub permissions: Vec<Permission>,
    }

    impl Default for ModuleVersion {
        fn default() -> Self {
            Self {
                tag: String::new(),
                description: String::new(),
                config_schema: empty_schema(),
                ui_schema: empty_schema(),
                commands: Vec::new(),
                hooks: Vec::new(),
                cron_jobs: Vec::new(),
                functions: Vec::new(),
                permissions: Vec::new(),
            }
        }
    }

    /// A chat command
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Command {
        /// Identity key
        pub name: String,
        /// Chat trigger word
        #[serde(default, deserialize_with = "null_as_default")]
        pub trigger: String,
        /// Help text shown to players
        #[serde(default, deserialize_with = "null_as_default")]
        pub help_text: String,
        /// Source code
        #[serde(default, deserialize_with = "null_as_default")]
        pub function: String,
        /// Declared arguments
        #[serde(default, deserialize_with = "null_as_default")]
        pub arguments: Vec<Argument>,
    }

    /// A command argument
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Argument {
        /// Argument name
        pub name: String,
        /// Argument type (string, number, boolean, player)
        #[serde(rename = "type", default, deserialize_with = "null_as_default")]
        pub arg_type: String,
        /// Help text
        #[serde(default, deserialize_with = "null_as_default")]
        pub help_text: String,
        /// Default value, if the argument is optional
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub default_value: Option<String>,
        /// Position in the command line
        #[serde(default, deserialize_with = "null_as_default")]
        pub position: u32,
    }

    /// A function triggered by a game/server event
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Hook {
        /// Identity key
        pub name: String,
        /// Event that triggers the hook
        #[serde(default, deserialize_with = "null_as_default")]
        pub event_type: String,
        /// Source code
        #[serde(default, deserialize_with = "null_as_default")]
        pub function: String,
        /// Optional description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// Optional regex filter on the event message
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub regex: Option<String>,
    }

    /// A function triggered on a cron schedule
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CronJob {
        /// Identity key
        pub name: String,
        /// Cron expression
        #[serde(default, deserialize_with = "null_as_default")]
        pub temporal_value: String,
        /// Source code
        #[serde(default, deserialize_with = "null_as_default")]
        pub function: String,
        /// Optional description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
    }

    /// A shared helper function
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Function {
        /// Identity key
        pub name: String,
        /// Source code
        #[serde(default, deserialize_with = "null_as_default")]
        pub function: String,
        /// Optional description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
    }

    /// A capability flag used for access control
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Permission {
        /// Dotted key, e.g. `SHOP.MANAGE_ITEMS`
        pub permission: String,
        /// Display name
        #[serde(default, deserialize_with = "null_as_default")]
        pub friendly_name: String,
        /// Description
        #[serde(default, deserialize_with = "null_as_default")]
        pub description: String,
        /// Whether the permission carries a count
        #[serde(default, deserialize_with = "null_as_default")]
        pub can_have_count: bool,
    }

    // =========================================================================
    // Catalog metadata
    // =========================================================================

    /// Where a module came from
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ModuleSource {
        /// Contributed externally, stored in the local modules directory
        Community,
        /// Shipped with Takaro itself
        Builtin,
    }

    impl ModuleSource {
        /// Lowercase label
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Community => "community",
                Self::Builtin => "builtin",
            }
        }
    }

    impl std::str::FromStr for ModuleSource {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "community" => Ok(Self::Community),
                "builtin" | "built-in" => Ok(Self::Builtin),
                other => Err(format!("unknown module source: {other}")),
            }
        }
    }

    /// A module plus the provenance the loader attached to it
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ModuleWithMeta {
        /// The module itself
        #[serde(flatten)]
        pub module: Module,
        /// Community or built-in
        pub source: ModuleSource,
        /// File path or URL the module was read from
        pub path: PathBuf,
        /// Category directory, if the file was nested in one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
    }

    impl ModuleWithMeta {
        /// Module name shortcut
        #[must_use]
        pub fn name(&self) -> &str {
            &self.module.name
        }
    }

    // =========================================================================
    // Serde helpers
    // =========================================================================

    pub(crate) fn empty_schema() -> String {
        "{}".to_string()
    }

    fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Schemas appear both as encoded strings and as inline objects in the wild
    fn schema_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(serde_json::Value::Null) => empty_schema(),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        })
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::changelog::types::*;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
