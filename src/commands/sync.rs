// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Sync command - snapshots built-in modules from GitHub into a feed file

use super::Session;
use crate::loader;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Run the sync-builtins command
pub async fn run(session: &Session, output: &Path) -> Result<()> {
    info!("Fetching built-in modules");
    let count = loader::sync_builtins(&session.config, &session.cache, output).await?;
    println!("Wrote {} built-in modules to {}", count, output.display());
    Ok(())
}
