//! Quantity aggregation - computes the cells to write for a submitted count.
//!
//! The whole batch is composed before anything is written. A location the
//! update does not mention keeps its stored value; an explicit blank clears it.
//! Row totals are exact decimal sums and stay blank when nothing on the row is
//! numeric, so an uncounted product never reads as "zero left".

use crate::{
    core::{columns::ColumnMap, location::normalize_identifier},
    errors::{Error, Result, StructuralError},
    models::{CellAddress, CellWrite, LedgerGrid, QuantityUpdate},
};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

// Digits with an optional fraction after a single `.` or `,`.
#[allow(clippy::unwrap_used)]
static PLAIN_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)?$").unwrap());

/// Result of coercing a free-text quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced {
    /// A non-negative decimal
    Number(Decimal),
    /// Blank or unparseable input; the cell is cleared, never zeroed
    Clear,
}

/// Coerces counted text into a quantity.
///
/// Accepts plain digits with `.` or `,` as the single decimal separator.
/// Signs, digit separators, exponents, blanks, values that cannot be held
/// without rounding and anything else coerce to [`Coerced::Clear`].
#[must_use]
pub fn coerce(raw: &str) -> Coerced {
    let trimmed = raw.trim();
    if !PLAIN_QUANTITY.is_match(trimmed) {
        return Coerced::Clear;
    }

    let text = trimmed.replace(',', ".");
    match Decimal::from_str_exact(&text) {
        Ok(value) => Coerced::Number(value),
        Err(_) => Coerced::Clear,
    }
}

/// Text written for a quantity (`2.50` is written as `2.5`).
#[must_use]
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Computes every cell write needed to apply `update` to `grid`.
///
/// Each touched location cell is emitted once, followed by the row's total
/// cell when the ledger has one. Rows the update does not mention produce no
/// writes. Update entries naming unknown products or locations without a
/// column are logged and skipped.
///
/// # Errors
/// Returns [`StructuralError::NoLocationColumns`] when `columns` has no
/// location columns, and [`Error::QuantityOverflow`] when a row total does
/// not fit a decimal. No writes are produced in either case.
pub fn aggregate(
    grid: &LedgerGrid,
    update: &QuantityUpdate,
    columns: &ColumnMap,
) -> Result<Vec<CellWrite>> {
    if columns.locations.is_empty() {
        return Err(StructuralError::NoLocationColumns.into());
    }
    if update.is_empty() {
        debug!("Empty update, nothing to write");
        return Ok(Vec::new());
    }

    // Last value wins when the same product is submitted twice for one location.
    let mut supplied: HashMap<(String, &str), &str> = HashMap::new();
    for (location, counted) in update.iter() {
        supplied.insert(
            (normalize_identifier(location), counted.name.trim()),
            counted.quantity.as_str(),
        );
    }

    let mut used: HashSet<(String, &str)> = HashSet::new();
    let mut writes = Vec::new();
    let mut touched_rows = 0usize;

    for (row, _) in grid.records() {
        let name = grid.cell(row, columns.fields.name).trim();
        if name.is_empty() {
            continue;
        }

        let mut touched = false;
        let mut counted = false;
        let mut total = Decimal::ZERO;

        for (id, location) in &columns.locations {
            let address = CellAddress::new(row, location.column);
            let key = (id.clone(), name);

            let effective = if let Some(raw) = supplied.get(&key) {
                touched = true;
                used.insert(key);
                match coerce(raw) {
                    Coerced::Number(value) => {
                        writes.push(CellWrite::new(address, format_quantity(value)));
                        Some(value)
                    }
                    Coerced::Clear => {
                        if !raw.trim().is_empty() {
                            debug!("Quantity {raw:?} for {name} at {id} is not a count, clearing {address}");
                        }
                        writes.push(CellWrite::new(address, String::new()));
                        None
                    }
                }
            } else {
                match coerce(grid.cell(row, location.column)) {
                    Coerced::Number(value) => Some(value),
                    Coerced::Clear => None,
                }
            };

            if let Some(value) = effective {
                total = total.checked_add(value).ok_or_else(|| Error::QuantityOverflow {
                    product: name.to_string(),
                    row,
                })?;
                counted = true;
            }
        }

        if !touched {
            continue;
        }
        touched_rows += 1;

        if let Some(total_column) = columns.total {
            let value = if counted {
                format_quantity(total)
            } else {
                String::new()
            };
            writes.push(CellWrite::new(CellAddress::new(row, total_column), value));
        }
    }

    for (location, counted) in update.iter() {
        let key = (normalize_identifier(location), counted.name.trim());
        if used.contains(&key) {
            continue;
        }
        if columns.location(location).is_none() {
            warn!("No column for location {location:?}, skipping {}", counted.name);
        } else {
            warn!("Product {:?} is not in the ledger, skipping", counted.name);
        }
    }

    info!(
        "Aggregated {} cell writes across {} rows",
        writes.len(),
        touched_rows
    );
    Ok(writes)
}
