//! Core ledger logic.
//!
//! Parsing, column resolution, snapshot building and aggregation are pure
//! functions over sheet grids. The lock registry is the only shared mutable
//! state. [`inventory::InventoryService`] composes them over a store.

/// Quantity coercion and cell-write batches for a submitted count
pub mod aggregate;
/// Upstream catalog import into the master sheet
pub mod catalog;
/// Header-driven column discovery
pub mod columns;
/// Caller-facing snapshot, save and lock operations
pub mod inventory;
/// Location assignment field parsing
pub mod location;
/// In-memory location lock registry
pub mod locks;
/// Location-indexed ledger views
pub mod snapshot;
