//! Snapshot building - turns ledger rows into location buckets for editing.
//!
//! A product listed under two locations shows up in both buckets. Products with
//! no location at all land in the [`BucketKey::Unassigned`] bucket so staff can
//! still see and place them.

use crate::{
    core::{columns::ColumnMap, location},
    models::{
        BucketEntry, BucketKey, LedgerGrid, LedgerSnapshot, LocationBucket, LocationKind,
        ProductRecord, SnapshotMode,
    },
};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Lifts every named data row of `grid` into a [`ProductRecord`].
///
/// Rows with a blank name are skipped. A blank unit becomes `default_unit`.
#[must_use]
pub fn read_products(grid: &LedgerGrid, columns: &ColumnMap, default_unit: &str) -> Vec<ProductRecord> {
    let fields = &columns.fields;
    let text = |row: usize, column: Option<usize>| {
        column.map_or_else(String::new, |c| grid.cell(row, c).trim().to_string())
    };

    grid.records()
        .filter_map(|(row, _)| {
            let name = grid.cell(row, fields.name).trim();
            if name.is_empty() {
                trace!("Skipping row {row} without a product name");
                return None;
            }

            let unit = text(row, fields.unit);
            Some(ProductRecord {
                row_index: row,
                name: name.to_string(),
                category: text(row, fields.category),
                kind: text(row, fields.kind),
                unit: if unit.is_empty() {
                    default_unit.to_string()
                } else {
                    unit
                },
                locations: location::tokens_for(
                    &text(row, fields.refrigerator),
                    &text(row, fields.shelf),
                ),
            })
        })
        .collect()
}

/// Builds the location-indexed view of a ledger.
///
/// In [`SnapshotMode::Replay`] each entry carries the value stored in the
/// quantity column of its bucket's location; locations without a column, and
/// every entry in [`SnapshotMode::Template`], carry a blank quantity.
#[must_use]
pub fn build(
    grid: &LedgerGrid,
    columns: &ColumnMap,
    mode: SnapshotMode,
    default_unit: &str,
) -> LedgerSnapshot {
    let products = read_products(grid, columns, default_unit);
    let mut buckets: Vec<LocationBucket> = Vec::new();
    let mut positions: HashMap<BucketKey, usize> = HashMap::new();

    for product in &products {
        for (key, kinds) in bucket_keys(product) {
            let quantity = match (&key, mode) {
                (BucketKey::Location(id), SnapshotMode::Replay) => columns
                    .location(id)
                    .map(|l| grid.cell(product.row_index, l.column).trim().to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            };

            let position = *positions.entry(key.clone()).or_insert_with(|| {
                buckets.push(LocationBucket {
                    key: key.clone(),
                    entries: Vec::new(),
                });
                buckets.len() - 1
            });

            buckets[position].entries.push(BucketEntry {
                name: product.name.clone(),
                category: product.category.clone(),
                kind: product.kind.clone(),
                unit: product.unit.clone(),
                row_index: product.row_index,
                assigned_as: kinds,
                current_quantity: quantity.clone(),
                saved_quantity: quantity,
            });
        }
    }

    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    debug!(
        "Built {:?} snapshot: {} products in {} buckets",
        mode,
        products.len(),
        buckets.len()
    );

    LedgerSnapshot {
        date: None,
        mode,
        buckets,
    }
}

// Distinct identifiers of a product in first-seen order, with every kind that named them.
fn bucket_keys(product: &ProductRecord) -> Vec<(BucketKey, Vec<LocationKind>)> {
    let mut keys: Vec<(BucketKey, Vec<LocationKind>)> = Vec::new();
    for token in &product.locations {
        let key = BucketKey::Location(token.number.clone());
        match keys.iter_mut().find(|(k, _)| *k == key) {
            Some((_, kinds)) => {
                if !kinds.contains(&token.kind) {
                    kinds.push(token.kind);
                }
            }
            None => keys.push((key, vec![token.kind])),
        }
    }
    if keys.is_empty() {
        keys.push((BucketKey::Unassigned, Vec::new()));
    }
    keys
}
