// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes a module as JSON or as a dashboard import payload

use super::Session;
use crate::catalog;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full module JSON with every version
    Module,
    /// Module name plus the flattened latest version
    Payload,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "module" | "json" => Some(Self::Module),
            "payload" | "import" => Some(Self::Payload),
            _ => None,
        }
    }
}

/// Run the export command
pub async fn run(session: &Session, name: &str, format: &str, output: Option<PathBuf>) -> Result<()> {
    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {}. Supported: module, payload", format))?;

    let modules = session.catalog().await;
    let entry = catalog::find(&modules, name)
        .ok_or_else(|| anyhow::anyhow!("Module not found: {}", name))?;
    info!("Exporting {} as {:?}", entry.name(), export_format);

    let content = match export_format {
        ExportFormat::Module => catalog::export_module(&entry.module).context("Failed to serialize module")?,
        ExportFormat::Payload => {
            let payload = catalog::import_payload(&entry.module)
                .ok_or_else(|| anyhow::anyhow!("Module {} has no versions to export", entry.name()))?;
            serde_json::to_string_pretty(&payload).context("Failed to serialize payload")?
        }
    };

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            eprintln!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
