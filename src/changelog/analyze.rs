// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Functional diff between two snapshots of a module
//!
//! Only the first version of each snapshot is compared. Entities are matched
//! by identity key (name, or `permission` for permissions); an entity whose
//! body changes while its key stays the same is not reported.

use super::types::{Analysis, ChangeAction, ChangeDetail};
use crate::catalog::schema_properties;
use crate::types::{Module, ModuleVersion};
use std::collections::HashSet;

/// Description used when no clause could be generated
pub const FALLBACK_DESCRIPTION: &str = "Module updated with improvements and fixes.";

/// Compare `before` (None for a new module) with `after`
#[must_use]
pub fn analyze(before: Option<&Module>, after: &Module, module_name: &str) -> Analysis {
    let skeleton = ModuleVersion::default();
    let old = before.and_then(|m| m.versions.first()).unwrap_or(&skeleton);
    let new = after.versions.first().unwrap_or(&skeleton);

    let mut details = Vec::new();

    if old.tag != new.tag && !new.tag.is_empty() {
        details.push(ChangeDetail::Version {
            action: ChangeAction::Updated,
            name: new.tag.clone(),
            from: (!old.tag.is_empty()).then(|| old.tag.clone()),
            to: new.tag.clone(),
        });
    }

    let (added, removed) = diff_by_key(&old.commands, &new.commands, |c| &c.name);
    details.extend(
        tagged(added, removed).map(|(action, c)| ChangeDetail::Command {
            action,
            name: c.name.clone(),
            trigger: c.trigger.clone(),
        }),
    );

    let (added, removed) = diff_by_key(&old.hooks, &new.hooks, |h| &h.name);
    details.extend(tagged(added, removed).map(|(action, h)| ChangeDetail::Hook {
        action,
        name: h.name.clone(),
        event_type: h.event_type.clone(),
    }));

    let (added, removed) = diff_by_key(&old.cron_jobs, &new.cron_jobs, |j| &j.name);
    details.extend(
        tagged(added, removed).map(|(action, j)| ChangeDetail::CronJob {
            action,
            name: j.name.clone(),
            temporal_value: j.temporal_value.clone(),
        }),
    );

    let (added, removed) = diff_by_key(&old.functions, &new.functions, |f| &f.name);
    details.extend(
        tagged(added, removed).map(|(action, f)| ChangeDetail::Function {
            action,
            name: f.name.clone(),
        }),
    );

    let (added, removed) = diff_by_key(&old.permissions, &new.permissions, |p| &p.permission);
    details.extend(
        tagged(added, removed).map(|(action, p)| ChangeDetail::Permission {
            action,
            name: p.permission.clone(),
            friendly_name: p.friendly_name.clone(),
        }),
    );

    let old_props = schema_properties(&old.config_schema);
    let new_props = schema_properties(&new.config_schema);
    details.extend(new_props.difference(&old_props).map(|key| ChangeDetail::Config {
        action: ChangeAction::Added,
        name: key.clone(),
    }));
    details.extend(old_props.difference(&new_props).map(|key| ChangeDetail::Config {
        action: ChangeAction::Removed,
        name: key.clone(),
    }));

    if details.is_empty() {
        return Analysis::default();
    }

    Analysis {
        has_changes: true,
        title: title(before.is_none(), module_name, &details),
        description: describe(&details),
        details,
    }
}

/// Entities of `after` missing from `before`, and of `before` missing from `after`
fn diff_by_key<'a, T>(
    before: &'a [T],
    after: &'a [T],
    key: impl Fn(&T) -> &String,
) -> (Vec<&'a T>, Vec<&'a T>) {
    let before_keys: HashSet<&String> = before.iter().map(&key).collect();
    let after_keys: HashSet<&String> = after.iter().map(&key).collect();

    let mut seen = HashSet::new();
    let added = after
        .iter()
        .filter(|item| !before_keys.contains(key(*item)) && seen.insert(key(*item)))
        .collect();

    let mut seen = HashSet::new();
    let removed = before
        .iter()
        .filter(|item| !after_keys.contains(key(*item)) && seen.insert(key(*item)))
        .collect();

    (added, removed)
}

fn tagged<'a, T>(added: Vec<&'a T>, removed: Vec<&'a T>) -> impl Iterator<Item = (ChangeAction, &'a T)> {
    added
        .into_iter()
        .map(|item| (ChangeAction::Added, item))
        .chain(removed.into_iter().map(|item| (ChangeAction::Removed, item)))
}

fn title(is_new: bool, module_name: &str, details: &[ChangeDetail]) -> String {
    if is_new {
        return format!("New Module: {module_name}");
    }

    let commands: Vec<_> = details
        .iter()
        .filter(|d| matches!(d, ChangeDetail::Command { .. }))
        .collect();
    if let [only] = commands.as_slice() {
        return format!("Command Update: {}", only.name());
    }
    if !commands.is_empty() {
        return format!("Updated {} Commands", commands.len());
    }

    let hooks: Vec<_> = details
        .iter()
        .filter(|d| matches!(d, ChangeDetail::Hook { .. }))
        .collect();
    if let [only] = hooks.as_slice() {
        return format!("Hook Update: {}", only.name());
    }
    if !hooks.is_empty() {
        return format!("Updated {} Hooks", hooks.len());
    }

    let mut functional = details
        .iter()
        .filter(|d| !matches!(d, ChangeDetail::Version { .. }))
        .peekable();
    if functional.peek().is_some() && functional.all(|d| matches!(d, ChangeDetail::Config { .. })) {
        return "Configuration Updated".to_string();
    }

    "Module Updated".to_string()
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(details: &[ChangeDetail]) -> String {
    let mut clauses = Vec::new();

    if let Some(ChangeDetail::Version { to, .. }) = details.iter().find(|d| matches!(d, ChangeDetail::Version { .. })) {
        clauses.push(format!("Version updated to `{to}`"));
    }

    let buckets: [(&str, ChangeAction, &str, &str, &str); 12] = [
        ("command", ChangeAction::Added, "Added", "command", "commands"),
        ("command", ChangeAction::Removed, "Removed", "command", "commands"),
        ("hook", ChangeAction::Added, "Added", "hook", "hooks"),
        ("hook", ChangeAction::Removed, "Removed", "hook", "hooks"),
        ("cronjob", ChangeAction::Added, "Added", "cron job", "cron jobs"),
        ("cronjob", ChangeAction::Removed, "Removed", "cron job", "cron jobs"),
        ("function", ChangeAction::Added, "Added", "function", "functions"),
        ("function", ChangeAction::Removed, "Removed", "function", "functions"),
        ("permission", ChangeAction::Added, "Added", "permission", "permissions"),
        ("permission", ChangeAction::Removed, "Removed", "permission", "permissions"),
        ("config", ChangeAction::Added, "New", "config option", "config options"),
        ("config", ChangeAction::Removed, "Removed", "config option", "config options"),
    ];

    for (kind, action, verb, singular, plural) in buckets {
        let names: Vec<&str> = details
            .iter()
            .filter(|d| d.kind() == kind && d.action() == action)
            .map(ChangeDetail::name)
            .collect();
        if names.is_empty() {
            continue;
        }
        let noun = if names.len() == 1 { singular } else { plural };
        clauses.push(format!("{verb} {noun} {}", quoted(&names)));
    }

    if clauses.is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        format!("{}.", clauses.join(". "))
    }
}
