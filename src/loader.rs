// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Module source loading
//!
//! Community modules are read from a local directory tree; built-in modules
//! come from a pre-generated JSON feed or a GitHub directory listing. A file
//! that cannot be read, parsed or validated is logged and skipped, never
//! fatal: the loader always hands back a (possibly empty) list.

use crate::cache::ResponseCache;
use crate::catalog;
use crate::config::{BuiltinSource, Config};
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::types::{Module, ModuleSource, ModuleWithMeta};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Check the required top-level shape of a module document
#[must_use]
pub fn is_module(value: &Value) -> bool {
    missing_field(value).is_none()
}

fn missing_field(value: &Value) -> Option<&'static str> {
    if !value.get("name").is_some_and(Value::is_string) {
        Some("`name` must be a string")
    } else if !value.get("versions").is_some_and(Value::is_array) {
        Some("`versions` must be an array")
    } else if !value.get("takaroVersion").is_some_and(Value::is_string) {
        Some("`takaroVersion` must be a string")
    } else {
        None
    }
}

/// Validate and convert a parsed document into a module
pub fn module_from_value(value: Value, origin: &str) -> Result<Module> {
    if let Some(reason) = missing_field(&value) {
        return Err(Error::Invalid {
            origin: origin.to_string(),
            reason: reason.to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| Error::json(origin, e))
}

/// Parse and validate module JSON text
pub fn parse_module(content: &str, origin: &str) -> Result<Module> {
    let value: Value = serde_json::from_str(content).map_err(|e| Error::json(origin, e))?;
    module_from_value(value, origin)
}

// =============================================================================
// Community modules
// =============================================================================

fn module_matcher(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0;
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
                added += 1;
            }
            Err(e) => warn!("Ignoring module pattern {:?}: {}", pattern, e),
        }
    }
    if added == 0 {
        if let Ok(glob) = Glob::new("**/*.json") {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Falling back to an empty module matcher: {}", e);
        GlobSet::empty()
    })
}

/// First directory component of a path relative to the modules root
fn category_of(relative: &Path) -> Option<String> {
    let mut components = relative.components();
    let first = components.next()?;
    components.next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}

/// Load every valid community module under `dir`, ordered by path
#[must_use]
pub fn load_community(dir: &Path, patterns: &[String]) -> Vec<ModuleWithMeta> {
    if !dir.is_dir() {
        warn!("Community modules directory {} does not exist", dir.display());
        return Vec::new();
    }

    let matcher = module_matcher(patterns);
    let mut modules = Vec::new();

    let walker = WalkDir::new(dir).follow_links(false).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if !matcher.is_match(relative) {
            continue;
        }

        match read_module_file(path) {
            Ok(module) => {
                debug!("Loaded community module {} from {}", module.name, path.display());
                modules.push(ModuleWithMeta {
                    module,
                    source: ModuleSource::Community,
                    path: path.to_path_buf(),
                    category: category_of(relative),
                });
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    info!("Loaded {} community modules from {}", modules.len(), dir.display());
    modules
}

fn read_module_file(path: &Path) -> Result<Module> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_module(&content, &path.display().to_string())
}

// =============================================================================
// Built-in modules
// =============================================================================

/// Parse a feed document: an array of modules or `{ "modules": [...] }`
#[must_use]
pub fn parse_feed(value: Value, origin: &str) -> Vec<ModuleWithMeta> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("modules") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Feed {} has no `modules` array", origin);
                return Vec::new();
            }
        },
        _ => {
            warn!("Feed {} is neither an array nor an object", origin);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let item_origin = format!("{origin}#{i}");
            match module_from_value(item, &item_origin) {
                Ok(module) => Some(ModuleWithMeta {
                    module,
                    source: ModuleSource::Builtin,
                    path: PathBuf::from(&item_origin),
                    category: None,
                }),
                Err(e) => {
                    warn!("Skipping feed entry: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Load built-in modules from a feed file on disk
pub fn load_feed(path: &Path) -> Result<Vec<ModuleWithMeta>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let origin = path.display().to_string();
    let value: Value = serde_json::from_str(&content).map_err(|e| Error::json(&origin, e))?;
    Ok(parse_feed(value, &origin))
}

/// Load built-in modules from a GitHub directory of JSON files.
///
/// Descends one level into subdirectories. A listing failure at the top is
/// an error; failures on individual files are logged and skipped.
pub async fn load_github(
    client: &GitHubClient<'_>,
    owner: &str,
    repo: &str,
    path: &str,
    git_ref: &str,
) -> Result<Vec<ModuleWithMeta>> {
    let mut files = Vec::new();
    for entry in client.list_dir(owner, repo, path, git_ref).await? {
        if entry.is_dir() {
            match client.list_dir(owner, repo, &entry.path, git_ref).await {
                Ok(children) => files.extend(children.into_iter().filter(|c| c.is_file())),
                Err(e) => warn!("Skipping directory {}: {}", entry.path, e),
            }
        } else if entry.is_file() {
            files.push(entry);
        }
    }

    let mut modules = Vec::new();
    for file in files {
        if !file.name.ends_with(".json") {
            continue;
        }
        let Some(url) = file.download_url.as_deref() else {
            debug!("No download URL for {}", file.path);
            continue;
        };

        let result = match client.fetch_raw(url).await {
            Ok(body) => parse_module(&body, &file.path),
            Err(e) => Err(e),
        };
        match result {
            Ok(module) => modules.push(ModuleWithMeta {
                module,
                source: ModuleSource::Builtin,
                path: PathBuf::from(&file.path),
                category: None,
            }),
            Err(e) => warn!("Skipping built-in {}: {}", file.path, e),
        }
    }

    info!("Loaded {} built-in modules from {}/{}", modules.len(), owner, repo);
    Ok(modules)
}

/// Load built-in modules from the configured source
pub async fn load_builtin(config: &Config, cache: &ResponseCache) -> Result<Vec<ModuleWithMeta>> {
    match &config.builtin {
        BuiltinSource::Feed { path } => load_feed(path),
        BuiltinSource::Github {
            owner,
            repo,
            path,
            git_ref,
        } => {
            let client =
                GitHubClient::with_api_root(cache, config.github_token(), &config.github_api_root)?;
            load_github(&client, owner, repo, path, git_ref).await
        }
        BuiltinSource::None => Ok(Vec::new()),
    }
}

/// Load both sources concurrently and merge them into the catalog.
///
/// If the built-in side fails as a whole, the catalog is community-only.
pub async fn load_catalog(config: &Config, cache: &ResponseCache) -> Vec<ModuleWithMeta> {
    let dir = config.modules_dir.clone();
    let patterns = config.module_patterns.clone();
    let community = tokio::task::spawn_blocking(move || load_community(&dir, &patterns));

    let (community, builtin) = tokio::join!(community, load_builtin(config, cache));

    let community = community.unwrap_or_else(|e| {
        warn!("Community loader task failed: {}", e);
        Vec::new()
    });
    let builtin = builtin.unwrap_or_else(|e| {
        warn!("Built-in modules unavailable, showing community modules only: {}", e);
        Vec::new()
    });

    catalog::merge(community, builtin)
}

/// Fetch built-in modules from GitHub and write them as a feed file
pub async fn sync_builtins(
    config: &Config,
    cache: &ResponseCache,
    output: &Path,
) -> anyhow::Result<usize> {
    use anyhow::Context;

    let BuiltinSource::Github {
        owner,
        repo,
        path,
        git_ref,
    } = &config.builtin
    else {
        anyhow::bail!("Built-in source is not GitHub; nothing to sync");
    };

    let client =
        GitHubClient::with_api_root(cache, config.github_token(), &config.github_api_root)?;
    let modules = load_github(&client, owner, repo, path, git_ref).await?;
    let feed: Vec<&Module> = modules.iter().map(|m| &m.module).collect();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&feed).context("Failed to serialize feed")?;
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(modules.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn patterns() -> Vec<String> {
        vec!["**/*.json".to_string()]
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    const VALID: &str = r#"{
        "name": "Greeter",
        "takaroVersion": "1.0.0",
        "versions": [{"tag": "latest", "commands": [{"name": "hello", "trigger": "hi"}]}]
    }"#;

    #[test]
    fn test_is_module() {
        assert!(is_module(&json!({"name": "a", "takaroVersion": "1", "versions": []})));
        assert!(!is_module(&json!({"name": "Minimal"})));
        assert!(!is_module(&json!({"name": 1, "takaroVersion": "1", "versions": []})));
        assert!(!is_module(&json!({"name": "a", "versions": []})));
        assert!(!is_module(&json!([])));
    }

    #[test]
    fn test_parse_fills_defaults() {
        let module = parse_module(VALID, "test").unwrap();
        let version = &module.versions[0];

        assert_eq!(version.description, "");
        assert_eq!(version.config_schema, "{}");
        assert_eq!(version.ui_schema, "{}");
        assert!(version.hooks.is_empty());
        assert_eq!(version.commands[0].help_text, "");
    }

    #[test]
    fn test_inline_schema_object_is_encoded() {
        let module = parse_module(
            r#"{"name": "m", "takaroVersion": "1", "versions": [{"tag": "latest", "configSchema": {"properties": {"a": {}}}}]}"#,
            "test",
        )
        .unwrap();

        let schema: Value = serde_json::from_str(&module.versions[0].config_schema).unwrap();
        assert!(schema["properties"]["a"].is_object());
    }

    #[test]
    fn test_load_community_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "greeter.json", VALID);
        write(dir.path(), "minimal.json", r#"{"name": "Minimal"}"#);
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "notes.txt", "ignored");

        let modules = load_community(dir.path(), &patterns());

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name(), "Greeter");
        assert_eq!(modules[0].source, ModuleSource::Community);
        assert!(modules[0].category.is_none());
    }

    #[test]
    fn test_load_community_category_from_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Economy/shop.json", &VALID.replace("Greeter", "Shop"));

        let modules = load_community(dir.path(), &patterns());

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].category.as_deref(), Some("Economy"));
    }

    #[test]
    fn test_load_community_missing_dir() {
        let modules = load_community(Path::new("/nonexistent/modules"), &patterns());
        assert!(modules.is_empty());
    }

    #[test]
    fn test_parse_feed_shapes() {
        let module = json!({"name": "a", "takaroVersion": "1", "versions": []});

        let from_array = parse_feed(json!([module.clone(), {"name": "bad"}]), "feed");
        assert_eq!(from_array.len(), 1);
        assert_eq!(from_array[0].source, ModuleSource::Builtin);

        let from_object = parse_feed(json!({"modules": [module]}), "feed");
        assert_eq!(from_object.len(), 1);

        assert!(parse_feed(json!("nope"), "feed").is_empty());
    }

    #[tokio::test]
    async fn test_catalog_falls_back_to_community() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "greeter.json", VALID);

        let config = Config {
            modules_dir: dir.path().to_path_buf(),
            builtin: BuiltinSource::Feed {
                path: dir.path().join("missing-feed.json"),
            },
            ..Config::default()
        };
        let cache = ResponseCache::default();

        let catalog = load_catalog(&config, &cache).await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name(), "Greeter");
    }

    #[tokio::test]
    async fn test_catalog_merges_feed() {
        let dir = TempDir::new().unwrap();
        let modules = dir.path().join("modules");
        write(&modules, "greeter.json", VALID);
        let feed = json!([
            {"name": "Greeter", "takaroVersion": "1", "versions": []},
            {"name": "Alpha", "takaroVersion": "1", "versions": []}
        ]);
        write(dir.path(), "feed.json", &feed.to_string());

        let config = Config {
            modules_dir: modules,
            builtin: BuiltinSource::Feed {
                path: dir.path().join("feed.json"),
            },
            ..Config::default()
        };
        let cache = ResponseCache::default();

        let catalog = load_catalog(&config, &cache).await;
        let names: Vec<_> = catalog.iter().map(ModuleWithMeta::name).collect();
        assert_eq!(names, vec!["Alpha", "Greeter"]);
        assert_eq!(catalog[1].source, ModuleSource::Community);
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let module = parse_module(
            r#"{"name": "m", "takaroVersion": "1", "versions": [{
                "tag": null,
                "commands": [{"name": "buy", "trigger": null, "function": null,
                              "arguments": [{"name": "item", "type": null, "position": null}]}],
                "hooks": [{"name": "greet", "eventType": null, "function": null}],
                "cronJobs": [{"name": "tick", "temporalValue": null, "function": null}],
                "functions": [{"name": "util", "function": null}],
                "permissions": [{"permission": "M.USE", "friendlyName": null, "canHaveCount": null}]
            }]}"#,
            "test",
        )
        .unwrap();
        let version = &module.versions[0];

        assert_eq!(version.tag, "");
        assert_eq!(version.commands[0].trigger, "");
        assert_eq!(version.commands[0].function, "");
        assert_eq!(version.commands[0].arguments[0].arg_type, "");
        assert_eq!(version.commands[0].arguments[0].position, 0);
        assert_eq!(version.hooks[0].event_type, "");
        assert_eq!(version.cron_jobs[0].temporal_value, "");
        assert_eq!(version.functions[0].function, "");
        assert_eq!(version.permissions[0].friendly_name, "");
        assert!(!version.permissions[0].can_have_count);
    }

    #[test]
    fn test_load_community_keeps_module_with_null_fields() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "greeter.json",
            r#"{"name": "Greeter", "takaroVersion": "1", "versions": [{"tag": "latest",
                "commands": [{"name": "hello", "trigger": null}],
                "hooks": [{"name": "welcome", "eventType": null}]}]}"#,
        );

        let modules = load_community(dir.path(), &patterns());

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].module.versions[0].commands[0].name, "hello");
    }

    // =========================================================================
    // GitHub source
    // =========================================================================

    /// Contents API with a subdirectory, a broken file, a missing file,
    /// an entry without a download URL and a non-JSON file
    async fn builtin_repo() -> MockServer {
        let server = MockServer::start().await;
        let raw = |name: &str| format!("{}/raw/{name}", server.uri());

        let listing = json!([
            {"name": "Fun", "path": "json/Fun", "download_url": null, "type": "dir"},
            {"name": "shop.json", "path": "json/shop.json", "download_url": raw("shop.json"), "type": "file"},
            {"name": "broken.json", "path": "json/broken.json", "download_url": raw("broken.json"), "type": "file"},
            {"name": "gone.json", "path": "json/gone.json", "download_url": raw("gone.json"), "type": "file"},
            {"name": "orphan.json", "path": "json/orphan.json", "download_url": null, "type": "file"},
            {"name": "README.md", "path": "json/README.md", "download_url": raw("README.md"), "type": "file"}
        ]);
        let fun = json!([
            {"name": "dice.json", "path": "json/Fun/dice.json", "download_url": raw("dice.json"), "type": "file"}
        ]);

        Mock::given(method("GET"))
            .and(path("/repos/gettakaro/takaro/contents/json"))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/gettakaro/takaro/contents/json/Fun"))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fun))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/shop.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID.replace("Greeter", "Shop")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/dice.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID.replace("Greeter", "Dice")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/broken.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{ nope"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/gone.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Modules"))
            .expect(0)
            .mount(&server)
            .await;

        server
    }

    fn github_config(server: &MockServer, modules_dir: PathBuf) -> Config {
        Config {
            modules_dir,
            github_api_root: server.uri(),
            builtin: BuiltinSource::Github {
                owner: "gettakaro".into(),
                repo: "takaro".into(),
                path: "json".into(),
                git_ref: "main".into(),
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_load_github_descends_and_skips_bad_files() {
        let server = builtin_repo().await;
        let cache = ResponseCache::default();
        let client = GitHubClient::with_api_root(&cache, None, server.uri()).unwrap();

        let modules = load_github(&client, "gettakaro", "takaro", "json", "main")
            .await
            .unwrap();

        let names: Vec<_> = modules.iter().map(ModuleWithMeta::name).collect();
        assert_eq!(names, vec!["Dice", "Shop"]);
        assert!(modules.iter().all(|m| m.source == ModuleSource::Builtin));
        assert_eq!(modules[0].path, PathBuf::from("json/Fun/dice.json"));
    }

    #[tokio::test]
    async fn test_catalog_survives_github_outage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "greeter.json", VALID);
        let config = github_config(&server, dir.path().to_path_buf());
        let cache = ResponseCache::default();

        let err = load_builtin(&config, &cache).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 500, .. }));

        let catalog = load_catalog(&config, &cache).await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name(), "Greeter");
    }

    #[tokio::test]
    async fn test_sync_builtins_writes_loadable_feed() {
        let server = builtin_repo().await;
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("feeds/builtin.json");
        let config = github_config(&server, dir.path().join("modules"));
        let cache = ResponseCache::default();

        let count = sync_builtins(&config, &cache, &output).await.unwrap();
        assert_eq!(count, 2);

        let feed = load_feed(&output).unwrap();
        let names: Vec<_> = feed.iter().map(ModuleWithMeta::name).collect();
        assert_eq!(names, vec!["Dice", "Shop"]);
        assert!(feed.iter().all(|m| m.source == ModuleSource::Builtin));
    }

    #[tokio::test]
    async fn test_sync_builtins_requires_github_source() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("builtin.json");
        let config = Config {
            builtin: BuiltinSource::None,
            ..Config::default()
        };
        let cache = ResponseCache::default();

        assert!(sync_builtins(&config, &cache, &output).await.is_err());
        assert!(!output.exists());
    }
}
