// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Read-only client for the GitHub contents API
//!
//! Every response body passes through the shared [`ResponseCache`], so a
//! listing or file is fetched at most once per TTL window.

use crate::cache::ResponseCache;
use crate::error::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default API root
pub const API_ROOT: &str = "https://api.github.com";

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// File or directory name
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    /// Raw download URL (files only)
    #[serde(default)]
    pub download_url: Option<String>,
    /// "file", "dir", "symlink" or "submodule"
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl ContentEntry {
    /// True for plain files
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.entry_type == "file"
    }

    /// True for directories
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type == "dir"
    }
}

/// GitHub contents API client
pub struct GitHubClient<'a> {
    http: reqwest::Client,
    cache: &'a ResponseCache,
    api_root: String,
    token: Option<String>,
}

impl<'a> GitHubClient<'a> {
    /// Create a client against the public API
    pub fn new(cache: &'a ResponseCache, token: Option<String>) -> Result<Self> {
        Self::with_api_root(cache, token, API_ROOT)
    }

    /// Create a client against a custom API root (GitHub Enterprise, tests)
    pub fn with_api_root(
        cache: &'a ResponseCache,
        token: Option<String>,
        api_root: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            cache,
            api_root: api_root.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// URL of the contents endpoint for `path` at `git_ref`
    #[must_use]
    pub fn contents_url(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_root,
            owner,
            repo,
            path.trim_matches('/'),
            git_ref
        )
    }

    /// List a repository directory
    pub async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<ContentEntry>> {
        let url = self.contents_url(owner, repo, path, git_ref);
        let body = self.get_text(&url, "application/vnd.github+json").await?;
        serde_json::from_str(&body).map_err(|e| Error::json(url, e))
    }

    /// Fetch raw file bytes as text
    pub async fn fetch_raw(&self, url: &str) -> Result<String> {
        self.get_text(url, "application/vnd.github.raw").await
    }

    async fn get_text(&self, url: &str, accept: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url, self.cache.ttl()) {
            return Ok(body);
        }

        debug!("GET {}", url);
        let mut request = self.http.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        self.cache.set(url, body.clone());
        Ok(body)
    }
}
