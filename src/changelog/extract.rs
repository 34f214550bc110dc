// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Extraction of module file snapshots from git history

use super::types::ChangeRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gix::ObjectId;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Category assigned to files directly under the modules path
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Module JSON blobs in a tree, keyed by repository-relative path
type Snapshot = BTreeMap<String, ObjectId>;

/// Walk every non-merge commit reachable from `HEAD` and record each module
/// file it added, modified or deleted under `modules_path`
pub fn extract(repo_path: &Path, modules_path: &str) -> Result<Vec<ChangeRecord>> {
    let repo = gix::open(repo_path)
        .with_context(|| format!("Failed to open git repository at {}", repo_path.display()))?;
    let history = walk(&repo, modules_path.trim_matches('/'))?;

    info!(
        "Extracted {} module changes from {} commits in {} ({} tree traversals)",
        history.records.len(),
        history.commits,
        repo_path.display(),
        history.traversals
    );
    Ok(history.records)
}

struct Walk {
    records: Vec<ChangeRecord>,
    commits: usize,
    traversals: usize,
}

/// Snapshots of commits seen as a parent but not yet visited themselves.
///
/// An entry is dropped as soon as its own commit is visited.
#[derive(Default)]
struct Snapshots {
    pending: HashMap<ObjectId, Snapshot>,
    traversals: usize,
}

impl Snapshots {
    fn traverse(&mut self, tree: &gix::Tree<'_>, prefix: &str) -> Result<Snapshot> {
        self.traversals += 1;
        snapshot(tree, prefix)
    }

    /// Snapshot of the commit being visited; it is never needed again
    fn take(&mut self, commit: &gix::Commit<'_>, prefix: &str) -> Result<Snapshot> {
        match self.pending.remove(&commit.id) {
            Some(snapshot) => Ok(snapshot),
            None => self.traverse(&commit.tree()?, prefix),
        }
    }

    /// Snapshot of a parent, kept until the walk visits that parent
    fn parent(&mut self, repo: &gix::Repository, id: ObjectId, prefix: &str) -> Result<&Snapshot> {
        if !self.pending.contains_key(&id) {
            let snapshot = self.traverse(&repo.find_commit(id)?.tree()?, prefix)?;
            self.pending.insert(id, snapshot);
        }
        self.pending
            .get(&id)
            .with_context(|| format!("Snapshot of {id} went missing"))
    }
}

fn walk(repo: &gix::Repository, prefix: &str) -> Result<Walk> {
    let head = repo.head_id().context("Repository has no HEAD commit")?;

    let mut records = Vec::new();
    let mut commits = 0usize;
    let mut snapshots = Snapshots::default();
    let empty = Snapshot::new();

    let history = repo
        .rev_walk([head.detach()])
        .all()
        .context("Failed to walk commit history")?;

    for info in history {
        let info = info.context("Failed to read commit during history walk")?;
        let commit = info.object().context("Failed to load commit")?;
        let parents: Vec<ObjectId> = commit.parent_ids().map(gix::Id::detach).collect();
        if parents.len() > 1 {
            snapshots.pending.remove(&commit.id);
            continue;
        }
        commits += 1;

        let after = snapshots.take(&commit, prefix)?;
        let before = match parents.first() {
            Some(parent) => snapshots.parent(repo, *parent, prefix)?,
            None => &empty,
        };

        let touched: BTreeSet<&String> = before
            .keys()
            .chain(after.keys())
            .filter(|path| before.get(*path) != after.get(*path))
            .collect();
        if touched.is_empty() {
            continue;
        }

        let hash = commit.id.to_string();
        let time = commit.time().context("Commit has no valid time")?;
        let commit_date = DateTime::<Utc>::from_timestamp(time.seconds, 0).unwrap_or_default();
        let author = commit
            .author()
            .map(|a| a.name.to_string())
            .unwrap_or_default();
        let message = commit
            .message()
            .map(|m| m.summary().to_string())
            .unwrap_or_default();

        for path in touched {
            let json_before = before.get(path).and_then(|id| read_json(repo, *id, path));
            let json_after = after.get(path).and_then(|id| read_json(repo, *id, path));

            records.push(ChangeRecord {
                module_name: module_name(json_after.as_ref(), json_before.as_ref(), path),
                category: category(path, prefix),
                commit_hash: hash.clone(),
                commit_date,
                commit_author: author.clone(),
                commit_message: message.clone(),
                file_path: path.clone(),
                json_before,
                json_after,
            });
        }
    }

    Ok(Walk {
        records,
        commits,
        traversals: snapshots.traversals,
    })
}

/// Collect `*.json` blobs under `prefix` in a tree
fn snapshot(tree: &gix::Tree<'_>, prefix: &str) -> Result<Snapshot> {
    let mut recorder = gix::traverse::tree::Recorder::default();
    tree.traverse()
        .breadthfirst(&mut recorder)
        .context("Failed to traverse tree")?;

    Ok(recorder
        .records
        .into_iter()
        .filter(|entry| entry.mode.is_blob())
        .filter_map(|entry| {
            let path = entry.filepath.to_string();
            is_module_path(&path, prefix).then_some((path, entry.oid))
        })
        .collect())
}

fn is_module_path(path: &str, prefix: &str) -> bool {
    let Some(ext) = Path::new(path).extension() else {
        return false;
    };
    if ext != "json" {
        return false;
    }
    prefix.is_empty()
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Parse a blob as JSON; anything unreadable is `None`
fn read_json(repo: &gix::Repository, id: ObjectId, path: &str) -> Option<Value> {
    let object = match repo.find_object(id) {
        Ok(o) => o,
        Err(e) => {
            debug!("Cannot read blob {} for {}: {}", id, path, e);
            return None;
        }
    };
    match serde_json::from_slice(&object.data) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Unparsable JSON in {} ({}): {}", path, id, e);
            None
        }
    }
}

fn module_name(after: Option<&Value>, before: Option<&Value>, path: &str) -> String {
    after
        .or(before)
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string())
        })
}

/// First directory below the modules path, if any
fn category(path: &str, prefix: &str) -> String {
    let relative = if prefix.is_empty() {
        path
    } else {
        path.strip_prefix(prefix)
            .map_or(path, |rest| rest.trim_start_matches('/'))
    };
    match relative.split_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}
