// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for catalog loading and remote fetches

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the catalog library
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        /// File path or URL the document came from
        origin: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// JSON present but not shaped like a module
    #[error("{origin} is not a module: {reason}")]
    Invalid {
        /// File path or URL the document came from
        origin: String,
        /// What was missing
        reason: String,
    },

    /// Transport failure talking to a remote source
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote source answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// Status code
        status: u16,
    },

    /// Bad module file glob
    #[error("invalid module pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl Error {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the origin it concerns
    pub fn json(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            origin: origin.into(),
            source,
        }
    }
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, Error>;
