// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! List command - prints the merged module catalog

use super::{print_entries, Session};
use crate::catalog::ModuleFilter;
use crate::types::ModuleSource;
use anyhow::Result;
use tracing::info;

/// Run the list command
pub async fn run(session: &Session, source: Option<ModuleSource>, category: Option<String>) -> Result<()> {
    let catalog = session.catalog().await;
    info!("Catalog holds {} modules", catalog.len());

    let filter = ModuleFilter {
        query: None,
        source,
        category,
    };
    print_entries(session, "Modules", &filter.apply(&catalog))
}
