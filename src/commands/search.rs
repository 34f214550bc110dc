// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Search command - filters the catalog by free text

use super::{print_entries, Session};
use crate::catalog::ModuleFilter;
use crate::types::ModuleSource;
use anyhow::Result;

/// Run the search command
pub async fn run(session: &Session, query: &str, source: Option<ModuleSource>) -> Result<()> {
    let catalog = session.catalog().await;
    let filter = ModuleFilter {
        query: Some(query.to_string()),
        source,
        category: None,
    };
    print_entries(session, &format!("Modules matching {query:?}"), &filter.apply(&catalog))
}
