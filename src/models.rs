//! Typed ledger values shared by the parsing, snapshot and aggregation layers.
//!
//! Raw sheet rows are lifted into these types once, at the boundary, so the rest
//! of the crate never passes positional string arrays around.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Which assignment field a location identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Refrigerated unit
    Refrigerator,
    /// Dry shelf
    Shelf,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refrigerator => f.write_str("Refrigerator"),
            Self::Shelf => f.write_str("Shelf"),
        }
    }
}

/// One storage slot a product is assigned to, e.g. `Refrigerator 3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationToken {
    /// Source field of the identifier
    pub kind: LocationKind,
    /// Location number rendered as a string (`"3"`)
    pub number: String,
}

impl fmt::Display for LocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.number)
    }
}

/// A product row read from a ledger sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Zero-based index of the row in the sheet grid (the header is row 0)
    pub row_index: usize,
    /// Product name, unique within a ledger and matched case-sensitively
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Catalog type label (menu product, ingredient, ...)
    pub kind: String,
    /// Unit of measure, already defaulted when the sheet cell was blank
    pub unit: String,
    /// Locations parsed from the refrigerator and shelf assignment fields
    pub locations: Vec<LocationToken>,
}

/// A rectangular-ish read of one sheet. Row 0 is the header; rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerGrid {
    rows: Vec<Vec<String>>,
}

impl LedgerGrid {
    /// Wraps raw rows as returned by the store.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Header row, empty when the sheet has no cells at all.
    #[must_use]
    pub fn header(&self) -> &[String] {
        self.rows.first().map_or(&[], Vec::as_slice)
    }

    /// Data rows paired with their grid index (starting at 1).
    pub fn records(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, row)| (index, row.as_slice()))
    }

    /// Text of a cell, or `""` when the row is shorter than `column`.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    /// All rows including the header.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Key of a snapshot bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    /// A location identifier such as `"2"`
    Location(String),
    /// Products with no location assigned at all
    Unassigned,
}

impl Ord for BucketKey {
    // Numeric identifiers sort by value, then anything else by text, sentinel last.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unassigned, Self::Unassigned) => Ordering::Equal,
            (Self::Unassigned, Self::Location(_)) => Ordering::Greater,
            (Self::Location(_), Self::Unassigned) => Ordering::Less,
            (Self::Location(a), Self::Location(b)) => {
                match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => a.cmp(b),
                }
            }
        }
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A product as it appears inside one location bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Product name
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Catalog type label
    pub kind: String,
    /// Unit of measure
    pub unit: String,
    /// Row of the product in the sheet grid
    pub row_index: usize,
    /// Assignment fields that placed the product in this bucket
    pub assigned_as: Vec<LocationKind>,
    /// Quantity already persisted for this location, possibly blank
    pub current_quantity: String,
    /// Same value, echoed back by editing clients
    pub saved_quantity: String,
}

/// Every product assigned to one bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationBucket {
    /// Location identifier or the sentinel
    pub key: BucketKey,
    /// Products in ledger row order
    pub entries: Vec<BucketEntry>,
}

/// Where a snapshot's quantities came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotMode {
    /// Master ledger read, quantities always blank
    Template,
    /// Previously saved count, quantities read from location columns
    Replay,
}

/// Location-indexed view of a ledger, re-derived on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Count date, `None` for an undated template read
    pub date: Option<NaiveDate>,
    /// Source of the quantities
    pub mode: SnapshotMode,
    /// Buckets ordered by key
    pub buckets: Vec<LocationBucket>,
}

impl LedgerSnapshot {
    /// Replaces the snapshot date.
    #[must_use]
    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Looks up a bucket by key.
    #[must_use]
    pub fn bucket(&self, key: &BucketKey) -> Option<&LocationBucket> {
        self.buckets.iter().find(|b| &b.key == key)
    }
}

/// One freshly counted value, as typed by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedQuantity {
    /// Product name as listed in the ledger
    pub name: String,
    /// Free-text quantity, coerced when aggregated
    pub quantity: String,
}

/// Counted values per location identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantityUpdate {
    by_location: BTreeMap<String, Vec<CountedQuantity>>,
}

impl QuantityUpdate {
    /// Empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `quantity` for `name` at `location`.
    pub fn insert(
        &mut self,
        location: impl Into<String>,
        name: impl Into<String>,
        quantity: impl Into<String>,
    ) {
        self.by_location
            .entry(location.into())
            .or_default()
            .push(CountedQuantity {
                name: name.into(),
                quantity: quantity.into(),
            });
    }

    /// Builder-style [`QuantityUpdate::insert`].
    #[must_use]
    pub fn with(
        mut self,
        location: impl Into<String>,
        name: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        self.insert(location, name, quantity);
        self
    }

    /// Every counted value with its location identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CountedQuantity)> {
        self.by_location
            .iter()
            .flat_map(|(location, counts)| counts.iter().map(move |c| (location.as_str(), c)))
    }

    /// True when no location carries a counted value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_location.values().all(Vec::is_empty)
    }
}

/// Zero-based position of one cell in a sheet grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    /// Zero-based row, the header is row 0
    pub row: usize,
    /// Zero-based column
    pub column: usize,
}

impl CellAddress {
    /// Address of `row`, `column`.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for CellAddress {
    /// Spreadsheet A1 notation (`G2` for row 1, column 6).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.column + 1;
        while n > 0 {
            let rem = u8::try_from((n - 1) % 26).unwrap_or(0);
            letters.push(char::from(b'A' + rem));
            n = (n - 1) / 26;
        }
        let column: String = letters.iter().rev().collect();
        write!(f, "{column}{}", self.row + 1)
    }
}

/// A value the store must persist at one address. Empty text clears the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWrite {
    /// Target cell
    pub address: CellAddress,
    /// Text to store, empty to clear
    pub value: String,
}

impl CellWrite {
    /// Write of `value` at `address`.
    #[must_use]
    pub fn new(address: CellAddress, value: impl Into<String>) -> Self {
        Self {
            address,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_address_a1_notation() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(1, 6).to_string(), "G2");
        assert_eq!(CellAddress::new(9, 25).to_string(), "Z10");
        assert_eq!(CellAddress::new(0, 26).to_string(), "AA1");
        assert_eq!(CellAddress::new(4, 27).to_string(), "AB5");
    }

    #[test]
    fn test_bucket_keys_sort_numerically_with_sentinel_last() {
        let mut keys = vec![
            BucketKey::Unassigned,
            BucketKey::Location("10".to_string()),
            BucketKey::Location("2".to_string()),
            BucketKey::Location("A".to_string()),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                BucketKey::Location("2".to_string()),
                BucketKey::Location("10".to_string()),
                BucketKey::Location("A".to_string()),
                BucketKey::Unassigned,
            ]
        );
    }

    #[test]
    fn test_grid_cells_beyond_ragged_rows_are_blank() {
        let grid = LedgerGrid::new(vec![
            vec!["Назва".to_string(), "Total".to_string()],
            vec!["Milk".to_string()],
        ]);
        assert_eq!(grid.cell(1, 0), "Milk");
        assert_eq!(grid.cell(1, 1), "");
        assert_eq!(grid.cell(7, 0), "");
        assert_eq!(grid.records().count(), 1);
    }
}
