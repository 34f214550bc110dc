// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Changelog extraction against a real git repository

use chrono::{TimeZone, Utc};
use std::fs;
use std::path::Path;
use std::process::Command;
use takaro_modules::changelog;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str], date: &str) -> bool {
    Command::new("git")
        .args(["-c", "user.name=Tester", "-c", "user.email=tester@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn shop(commands: &[&str]) -> String {
    let commands: Vec<_> = commands
        .iter()
        .map(|c| serde_json::json!({"name": c, "trigger": c, "function": ""}))
        .collect();
    serde_json::to_string_pretty(&serde_json::json!({
        "name": "EconomyShop",
        "takaroVersion": "1.0.0",
        "versions": [{"tag": "latest", "description": "Shop", "commands": commands}]
    }))
    .unwrap()
}

/// Two commits: the module appears, then gains a command
fn history() -> Option<TempDir> {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    if !git(root, &["init", "-q"], "2025-01-01T10:00:00Z") {
        return None;
    }

    fs::create_dir_all(root.join("modules/Economy")).unwrap();
    fs::write(root.join("modules/Economy/shop.json"), shop(&["buy"])).unwrap();
    fs::write(root.join("README.md"), "modules\n").unwrap();
    assert!(git(root, &["add", "."], "2025-01-01T10:00:00Z"));
    assert!(git(root, &["commit", "-q", "-m", "Add shop"], "2025-01-01T10:00:00Z"));

    fs::write(root.join("modules/Economy/shop.json"), shop(&["buy", "sell"])).unwrap();
    assert!(git(root, &["commit", "-q", "-am", "Add sell command"], "2025-01-02T10:00:00Z"));

    Some(dir)
}

#[test]
fn test_changelog_from_history() {
    let Some(dir) = history() else {
        eprintln!("git not available, skipping");
        return;
    };

    let generated = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let artifact = changelog::build(dir.path(), "modules", generated).unwrap();

    assert_eq!(artifact.global.len(), 2);
    assert_eq!(artifact.global[0].title, "Command Update: sell");
    assert!(!artifact.global[0].is_new);
    assert_eq!(artifact.global[1].title, "New Module: EconomyShop");
    assert!(artifact.global[1].is_new);
    assert!(artifact.global[0].date > artifact.global[1].date);
    assert!(artifact.global.iter().all(|e| e.category == "Economy"));
    assert!(artifact.global[0].description.contains("`sell`"));

    assert_eq!(artifact.by_module.len(), 1);
    assert_eq!(artifact.by_module["EconomyShop"].len(), 2);
    assert_eq!(artifact.generated_at, generated);
}

#[test]
fn test_changelog_write() {
    let Some(dir) = history() else {
        eprintln!("git not available, skipping");
        return;
    };

    let generated = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let artifact = changelog::build(dir.path(), "modules", generated).unwrap();
    let output = dir.path().join("out/changelog.json");
    changelog::write(&artifact, &output).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["generatedAt"], "2025-02-01T00:00:00Z");
    assert_eq!(json["global"][0]["moduleName"], "EconomyShop");
    assert_eq!(json["byModule"]["EconomyShop"][1]["isNew"], true);
}

#[test]
fn test_outside_prefix_is_ignored() {
    let Some(dir) = history() else {
        eprintln!("git not available, skipping");
        return;
    };

    let generated = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let artifact = changelog::build(dir.path(), "other", generated).unwrap();

    assert!(artifact.global.is_empty());
    assert!(artifact.by_module.is_empty());
}
