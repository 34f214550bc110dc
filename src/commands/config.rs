// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - prints the effective configuration

use super::Session;
use anyhow::{Context, Result};

/// Print the effective configuration, or a single dotted key
pub fn run(session: &Session, key: Option<&str>) -> Result<()> {
    match key {
        Some(k) => {
            let value = session
                .config
                .get(k)
                .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", k))?;
            match value {
                serde_json::Value::String(s) => println!("{s}"),
                other => println!("{other}"),
            }
        }
        None if session.json => {
            println!("{}", serde_json::to_string_pretty(&session.config)?);
        }
        None => {
            let text = toml::to_string_pretty(&session.config).context("Failed to render configuration")?;
            print!("{text}");
        }
    }
    Ok(())
}
