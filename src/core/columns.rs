//! Header-driven column discovery.
//!
//! Ledger sheets are edited by hand, so column positions are never assumed.
//! Every header cell goes through one normalization step (trim, lowercase,
//! whitespace collapse, Cyrillic/Latin homoglyph folding) and is then matched
//! against the known labels. Anything unmatched is ignored explicitly.

use crate::{
    core::location::normalize_identifier,
    errors::{Result, StructuralError},
    models::LocationKind,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

const REFRIGERATOR_LABELS: &[&str] = &["refrigerator", "fridge", "холодильник", "холодильники"];
const SHELF_LABELS: &[&str] = &["shelf", "стелаж", "стеллаж", "стелажі"];
const TOTAL_LABELS: &[&str] = &[
    "total",
    "remainder",
    "залишки",
    "залишок",
    "остаток",
    "остатки",
    "разом",
    "всього",
];
const NAME_LABELS: &[&str] = &["name", "product", "назва", "название"];
const CATEGORY_LABELS: &[&str] = &["category", "категорія", "категория"];
const TYPE_LABELS: &[&str] = &["type", "тип"];
const UNIT_LABELS: &[&str] = &["unit", "units", "одиниці виміру", "одиниці", "од. виміру"];

#[allow(clippy::unwrap_used)]
static LOCATION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<label>[^\d№#]+?)\s*[№#]?\s*(?P<number>\d+)$").unwrap()
});

/// Column holding the counted quantity for one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationColumn {
    /// Assignment kind named by the header label
    pub kind: LocationKind,
    /// Zero-based column index
    pub column: usize,
}

/// Positions of the static product fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldColumns {
    /// Product name column
    pub name: usize,
    /// Category column
    pub category: Option<usize>,
    /// Catalog type column
    pub kind: Option<usize>,
    /// Unit column
    pub unit: Option<usize>,
    /// Refrigerator assignment field (bare label, no number)
    pub refrigerator: Option<usize>,
    /// Shelf assignment field (bare label, no number)
    pub shelf: Option<usize>,
}

/// Everything the snapshot builder and the aggregator need to know about a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// Static product field positions
    pub fields: FieldColumns,
    /// Quantity column per location identifier
    pub locations: BTreeMap<String, LocationColumn>,
    /// Row total column
    pub total: Option<usize>,
}

impl ColumnMap {
    /// Quantity column for a location identifier.
    #[must_use]
    pub fn location(&self, id: &str) -> Option<&LocationColumn> {
        self.locations.get(&normalize_identifier(id))
    }

    /// True for columns that hold counts (location quantities and the total).
    #[must_use]
    pub fn is_quantity_column(&self, column: usize) -> bool {
        self.total == Some(column) || self.locations.values().any(|l| l.column == column)
    }
}

/// Resolves a header for writing: requires a name column and at least one
/// location column.
///
/// # Errors
/// Returns [`StructuralError`] when the header has no location columns, no
/// name column, or claims the same location number twice.
pub fn resolve(header: &[String]) -> Result<ColumnMap> {
    let map = resolve_layout(header)?;
    if map.locations.is_empty() {
        return Err(StructuralError::NoLocationColumns.into());
    }
    Ok(map)
}

/// Resolves a header for viewing: location columns are optional.
///
/// # Errors
/// Returns [`StructuralError`] when the header has no name column or claims
/// the same location number twice.
pub fn resolve_layout(header: &[String]) -> Result<ColumnMap> {
    let mut locations: BTreeMap<String, LocationColumn> = BTreeMap::new();
    let mut total = None;
    let mut name = None;
    let mut category = None;
    let mut kind = None;
    let mut unit = None;
    let mut refrigerator = None;
    let mut shelf = None;

    for (column, raw) in header.iter().enumerate() {
        let text = normalize_header(raw);
        if text.is_empty() {
            continue;
        }

        if let Some((kind, id)) = match_location(&text) {
            if let Some(existing) = locations.get(&id) {
                return Err(StructuralError::DuplicateLocation {
                    location: id,
                    first: existing.column,
                    second: column,
                }
                .into());
            }
            trace!("Column {column} ({raw:?}) holds {kind} {id}");
            locations.insert(id, LocationColumn { kind, column });
            continue;
        }

        let slot = if is_label(&text, TOTAL_LABELS) {
            &mut total
        } else if is_label(&text, NAME_LABELS) {
            &mut name
        } else if is_label(&text, CATEGORY_LABELS) {
            &mut category
        } else if is_label(&text, TYPE_LABELS) {
            &mut kind
        } else if is_label(&text, UNIT_LABELS) {
            &mut unit
        } else if is_label(&text, REFRIGERATOR_LABELS) {
            &mut refrigerator
        } else if is_label(&text, SHELF_LABELS) {
            &mut shelf
        } else {
            trace!("Ignoring unrecognized header {raw:?} at column {column}");
            continue;
        };

        if slot.is_some() {
            debug!("Header {raw:?} at column {column} repeats an earlier column, keeping the first");
        } else {
            *slot = Some(column);
        }
    }

    let name = name.ok_or(StructuralError::MissingColumn { field: "name" })?;
    debug!(
        "Resolved header: {} location columns, total column {:?}",
        locations.len(),
        total
    );

    Ok(ColumnMap {
        fields: FieldColumns {
            name,
            category,
            kind,
            unit,
            refrigerator,
            shelf,
        },
        locations,
        total,
    })
}

/// Lowercases, trims, collapses inner whitespace and folds homoglyphs so that
/// `"Холодильник  1"` typed with a Latin `o` matches the Cyrillic label.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            word.chars()
                .flat_map(char::to_lowercase)
                .map(fold_homoglyph)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Cyrillic letters that render identically to Latin ones fold to the Latin form.
const fn fold_homoglyph(c: char) -> char {
    match c {
        'а' => 'a',
        'е' => 'e',
        'о' => 'o',
        'р' => 'p',
        'с' => 'c',
        'х' => 'x',
        'у' => 'y',
        'і' => 'i',
        'к' => 'k',
        _ => c,
    }
}

fn is_label(text: &str, labels: &[&str]) -> bool {
    labels.iter().any(|label| normalize_header(label) == text)
}

fn match_location(text: &str) -> Option<(LocationKind, String)> {
    let captures = LOCATION_HEADER.captures(text)?;
    let label = captures.name("label")?.as_str().trim();
    let number = normalize_identifier(captures.name("number")?.as_str());
    if is_label(label, REFRIGERATOR_LABELS) {
        Some((LocationKind::Refrigerator, number))
    } else if is_label(label, SHELF_LABELS) {
        Some((LocationKind::Shelf, number))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_resolve_english_header() {
        let map = resolve(&header(&["Назва", "Refrigerator 1", "Refrigerator 2", "Total"])).unwrap();
        assert_eq!(map.fields.name, 0);
        assert_eq!(map.locations.len(), 2);
        assert_eq!(map.location("1").unwrap().column, 1);
        assert_eq!(map.location("2").unwrap().column, 2);
        assert_eq!(map.total, Some(3));
    }

    #[test]
    fn test_resolve_ukrainian_master_header() {
        let map = resolve(&header(&[
            "Холодильник",
            "Стелаж",
            "Назва",
            "Категорія",
            "Тип",
            "Одиниці виміру",
            "Холодильник 1",
            "Холодильник 2",
            "Стелаж 3",
            "Залишки",
        ]))
        .unwrap();

        assert_eq!(map.fields.refrigerator, Some(0));
        assert_eq!(map.fields.shelf, Some(1));
        assert_eq!(map.fields.name, 2);
        assert_eq!(map.fields.category, Some(3));
        assert_eq!(map.fields.kind, Some(4));
        assert_eq!(map.fields.unit, Some(5));
        assert_eq!(map.location("3").unwrap().kind, LocationKind::Shelf);
        assert_eq!(map.location("3").unwrap().column, 8);
        assert_eq!(map.total, Some(9));
    }

    #[test]
    fn test_resolve_tolerates_case_spacing_and_homoglyphs() {
        // "Xoлодильник" below uses Latin X and o
        let map = resolve(&header(&["  NAME ", "Xoлодильник   4", "SHELF №5", "fridge 06"])).unwrap();
        assert_eq!(map.location("4").unwrap().column, 1);
        assert_eq!(map.location("5").unwrap().column, 2);
        assert_eq!(map.location("6").unwrap().column, 3);
        assert_eq!(map.location("06").unwrap().column, 3);
    }

    #[test]
    fn test_resolve_maps_each_distinct_label_to_distinct_column() {
        let cells: Vec<String> = std::iter::once("Name".to_string())
            .chain((1..=17).map(|n| format!("Refrigerator {n}")))
            .chain(std::iter::once("Shelf 18".to_string()))
            .collect();
        let map = resolve(&cells).unwrap();
        assert_eq!(map.locations.len(), 18);
        let mut columns: Vec<usize> = map.locations.values().map(|l| l.column).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 18);
    }

    #[test]
    fn test_resolve_rejects_header_without_location_columns() {
        let result = resolve(&header(&["Назва", "Категорія", "Total"]));
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::NoLocationColumns))
        ));
    }

    #[test]
    fn test_resolve_rejects_duplicate_location_number() {
        let result = resolve(&header(&["Name", "Refrigerator 2", "Shelf 2"]));
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::DuplicateLocation {
                first: 1,
                second: 2,
                ..
            }))
        ));
    }

    #[test]
    fn test_resolve_requires_name_column() {
        let result = resolve(&header(&["Refrigerator 1", "Total"]));
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::MissingColumn { field: "name" }))
        ));
    }

    #[test]
    fn test_layout_allows_missing_location_columns() {
        let map = resolve_layout(&header(&["Назва", "Комментарий", "Room 4"])).unwrap();
        assert!(map.locations.is_empty());
        assert!(map.total.is_none());
    }

    #[test]
    fn test_quantity_columns() {
        let map = resolve(&header(&["Name", "Shelf 1", "Total", "Notes"])).unwrap();
        assert!(!map.is_quantity_column(0));
        assert!(map.is_quantity_column(1));
        assert!(map.is_quantity_column(2));
        assert!(!map.is_quantity_column(3));
    }
}
