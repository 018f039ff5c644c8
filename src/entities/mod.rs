//! Entity module - SeaORM definitions for the sheet store.
//! A ledger is a set of sheets; each sheet is a sparse grid of text cells.

/// Cells of a sheet
pub mod cell;
/// Named sheets
pub mod sheet;

pub use cell::{Column as CellColumn, Entity as Cell, Model as CellModel};
pub use sheet::{Column as SheetColumn, Entity as Sheet, Model as SheetModel};
