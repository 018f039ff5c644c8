//! Catalog import - adds products from the upstream catalog to the master sheet.
//!
//! The catalog is read-only and external. Import only ever appends: names
//! already in the ledger (compared trimmed and case-insensitively) are skipped,
//! as are repeated catalog ids within one batch. Nothing in the ledger is
//! modified or removed.

use crate::{
    core::columns::resolve_layout,
    errors::Result,
    models::LedgerGrid,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info};

/// What kind of catalog entry a product came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogItemKind {
    /// Sold as is
    MenuProduct,
    /// Recipe card
    TechCard,
    /// Semi-finished product made in house
    Prepack,
    /// Raw ingredient
    Ingredient,
}

impl CatalogItemKind {
    /// Label written into the ledger's type column.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MenuProduct => "Продукт меню",
            Self::TechCard => "Тех.карта",
            Self::Prepack => "Напівфабрикат",
            Self::Ingredient => "Інгредієнт",
        }
    }
}

/// One product as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Catalog identifier, unique per catalog entry
    pub id: String,
    /// Product name as it should appear in the ledger
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Entry kind, written as its ledger label
    pub kind: CatalogItemKind,
}

/// Upstream product catalog. Implementations own their transport.
pub trait ProductCatalog: Send + Sync {
    /// Every item the catalog currently offers.
    fn fetch_items(&self) -> impl Future<Output = Result<Vec<CatalogItem>>> + Send;
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Items returned by the catalog
    pub fetched: usize,
    /// Rows appended to the master sheet
    pub added: usize,
}

/// Rows to append to `master` for catalog items it does not contain yet.
///
/// Each row is as wide as the header; name, category and type go into their
/// resolved columns and everything else stays blank.
///
/// # Errors
/// Returns a structural error when the master header has no name column.
pub fn merge_catalog_rows(master: &LedgerGrid, items: &[CatalogItem]) -> Result<Vec<Vec<String>>> {
    let columns = resolve_layout(master.header())?;
    let fields = columns.fields;
    let width = master.header().len();

    let mut known: HashSet<String> = master
        .records()
        .map(|(row, _)| catalog_key(master.cell(row, fields.name)))
        .filter(|key| !key.is_empty())
        .collect();

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut new_rows = Vec::new();
    for item in items {
        let id = item.id.trim();
        if !id.is_empty() && !seen_ids.insert(id) {
            debug!("Skipping repeated catalog id {id} ({:?})", item.name);
            continue;
        }
        let key = catalog_key(&item.name);
        if key.is_empty() || !known.insert(key) {
            debug!("Skipping catalog item {:?} ({})", item.name, item.id);
            continue;
        }

        let mut row = vec![String::new(); width];
        row[fields.name] = item.name.trim().to_string();
        if let Some(column) = fields.category {
            row[column] = item.category.trim().to_string();
        }
        if let Some(column) = fields.kind {
            row[column] = item.kind.label().to_string();
        }
        new_rows.push(row);
    }

    info!(
        "Catalog merge: {} items offered, {} new",
        items.len(),
        new_rows.len()
    );
    Ok(new_rows)
}

fn catalog_key(name: &str) -> String {
    name.trim().to_lowercase()
}
