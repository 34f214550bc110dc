// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show command - prints one module in detail

use super::Session;
use crate::catalog;
use anyhow::Result;

/// Run the show command
pub async fn run(session: &Session, name: &str, tag: Option<&str>) -> Result<()> {
    let modules = session.catalog().await;
    let entry = catalog::find(&modules, name)
        .ok_or_else(|| anyhow::anyhow!("Module not found: {}", name))?;
    let module = &entry.module;

    let version = match tag {
        Some(t) => catalog::find_version(module, t).ok_or_else(|| {
            let tags: Vec<_> = module.versions.iter().map(|v| v.tag.as_str()).collect();
            anyhow::anyhow!("Version {} not found. Available: {}", t, tags.join(", "))
        })?,
        None => catalog::latest_version(module)
            .ok_or_else(|| anyhow::anyhow!("Module {} has no versions", module.name))?,
    };

    if session.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "name": module.name,
                "source": entry.source,
                "path": entry.path,
                "category": entry.category,
                "takaroVersion": module.takaro_version,
                "tags": module.versions.iter().map(|v| &v.tag).collect::<Vec<_>>(),
                "version": version,
            }))?
        );
        return Ok(());
    }

    println!("{}", session.heading(&format!("Module: {}", module.name)));
    println!("  source: {}", entry.source.as_str());
    println!("  path: {}", entry.path.display());
    if let Some(category) = &entry.category {
        println!("  category: {category}");
    }
    if !module.takaro_version.is_empty() {
        println!("  takaro version: {}", module.takaro_version);
    }
    let tags: Vec<_> = module.versions.iter().map(|v| v.tag.as_str()).collect();
    println!("  versions: {}", tags.join(", "));
    println!();

    println!("{}", session.heading(&format!("Version {}", version.tag)));
    if !version.description.is_empty() {
        println!("  {}", version.description.trim());
    }

    if !version.commands.is_empty() {
        println!("\n  Commands ({}):", version.commands.len());
        for command in &version.commands {
            println!(
                "    {} {}",
                session.accent(&command.trigger),
                session.dim(&command.help_text)
            );
            for arg in &command.arguments {
                let default = arg
                    .default_value
                    .as_deref()
                    .map(|d| format!(" = {d}"))
                    .unwrap_or_default();
                println!("      <{}: {}{}>", arg.name, arg.arg_type, default);
            }
        }
    }

    if !version.hooks.is_empty() {
        println!("\n  Hooks ({}):", version.hooks.len());
        for hook in &version.hooks {
            println!("    {} on {}", session.accent(&hook.name), hook.event_type);
        }
    }

    if !version.cron_jobs.is_empty() {
        println!("\n  Cron jobs ({}):", version.cron_jobs.len());
        for job in &version.cron_jobs {
            println!("    {} [{}]", session.accent(&job.name), job.temporal_value);
        }
    }

    if !version.functions.is_empty() {
        println!("\n  Functions ({}):", version.functions.len());
        for function in &version.functions {
            println!("    {}", session.accent(&function.name));
        }
    }

    if !version.permissions.is_empty() {
        println!("\n  Permissions ({}):", version.permissions.len());
        for permission in &version.permissions {
            let count = if permission.can_have_count { " (count)" } else { "" };
            println!(
                "    {}{} {}",
                session.accent(&permission.permission),
                count,
                session.dim(&permission.friendly_name)
            );
        }
    }

    let options = catalog::schema_properties(&version.config_schema);
    if !options.is_empty() {
        println!("\n  Config options ({}):", options.len());
        for option in options {
            println!("    {option}");
        }
    }

    Ok(())
}
