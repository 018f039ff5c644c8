//! Inventory service - the operations an HTTP layer calls.
//!
//! Reading a snapshot, saving a count and managing location locks all go
//! through [`InventoryService`]. The pure pieces (column resolution, snapshot
//! building, aggregation) run between store reads and writes; all I/O is
//! awaited here and nowhere else.

use crate::{
    cache::TtlCache,
    config::{AppConfig, LedgerConfig},
    core::{
        aggregate,
        catalog::{self, ImportSummary, ProductCatalog},
        columns::{self, ColumnMap},
        locks::{AcquireOutcome, Lock, LockRegistry},
        snapshot,
    },
    errors::{Error, Result},
    models::{LedgerGrid, LedgerSnapshot, QuantityUpdate, SnapshotMode},
    store::LedgerStore,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// A snapshot plus whether it came from a saved count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotView {
    /// The location-indexed view
    pub snapshot: LedgerSnapshot,
    /// True when `snapshot` was replayed from an existing dated count
    pub existing_inventory: bool,
}

/// Stock counting over one ledger store.
#[derive(Debug)]
pub struct InventoryService<S> {
    store: S,
    ledger: LedgerConfig,
    locks: LockRegistry,
    sheet_titles: TtlCache<Vec<String>>,
}

impl<S: LedgerStore> InventoryService<S> {
    /// Service over `store` configured by `config`.
    #[must_use]
    pub fn new(store: S, config: &AppConfig) -> Self {
        Self {
            store,
            ledger: config.ledger.clone(),
            locks: LockRegistry::new(config.locks.timeout()),
            sheet_titles: TtlCache::new(config.cache.ttl()),
        }
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Lock registry shared by every caller of this service.
    #[must_use]
    pub const fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Title of the sheet holding the count for `date`.
    #[must_use]
    pub fn snapshot_title(&self, date: NaiveDate) -> String {
        format!("{} {}", self.ledger.snapshot_prefix, date.format("%Y-%m-%d"))
    }

    async fn titles(&self) -> Result<Vec<String>> {
        if let Some(titles) = self.sheet_titles.get().await {
            return Ok(titles);
        }
        let titles = self.store.sheet_titles().await?;
        self.sheet_titles.put(titles.clone()).await;
        Ok(titles)
    }

    /// Whether a count was already saved for `date`.
    pub async fn snapshot_exists(&self, date: NaiveDate) -> Result<bool> {
        let title = self.snapshot_title(date);
        Ok(self.titles().await?.contains(&title))
    }

    /// Snapshot for `date` if a count was saved that day, otherwise the
    /// template built from the master sheet.
    #[instrument(skip(self))]
    pub async fn get_snapshot(&self, date: Option<NaiveDate>) -> Result<SnapshotView> {
        if let Some(date) = date {
            match self.load_saved_snapshot(date).await {
                Ok(snapshot) => {
                    info!("Serving saved count for {date}");
                    return Ok(SnapshotView {
                        snapshot,
                        existing_inventory: true,
                    });
                }
                Err(Error::SnapshotNotFound { .. }) => {
                    debug!("No saved count for {date}, falling back to the template");
                }
                Err(e) => return Err(e),
            }
        }

        let snapshot = self.load_template().await?.with_date(date);
        Ok(SnapshotView {
            snapshot,
            existing_inventory: false,
        })
    }

    /// Replays the count saved for `date`, without template fallback.
    ///
    /// # Errors
    /// [`Error::SnapshotNotFound`] when no count exists for `date`; a
    /// structural error when the dated sheet's header has no location columns.
    pub async fn load_saved_snapshot(&self, date: NaiveDate) -> Result<LedgerSnapshot> {
        if !self.snapshot_exists(date).await? {
            return Err(Error::SnapshotNotFound { date });
        }

        let grid = match self.store.read_rows(&self.snapshot_title(date)).await {
            Ok(grid) => grid,
            Err(Error::SheetNotFound { .. }) => {
                // Listing was stale; the sheet is gone.
                self.sheet_titles.invalidate().await;
                return Err(Error::SnapshotNotFound { date });
            }
            Err(e) => return Err(e),
        };
        let columns = columns::resolve(grid.header())?;
        Ok(snapshot::build(&grid, &columns, SnapshotMode::Replay, &self.ledger.default_unit)
            .with_date(Some(date)))
    }

    /// Template view of the master sheet, every quantity blank.
    pub async fn load_template(&self) -> Result<LedgerSnapshot> {
        let grid = self.store.read_rows(&self.ledger.master_sheet).await?;
        let columns = columns::resolve_layout(grid.header())?;
        Ok(snapshot::build(
            &grid,
            &columns,
            SnapshotMode::Template,
            &self.ledger.default_unit,
        ))
    }

    /// Saves counted quantities for `date` and returns the dated sheet title.
    ///
    /// The dated sheet is created from the master sheet on first save. The
    /// whole write batch is computed before anything is written.
    ///
    /// # Errors
    /// A structural error when either header cannot be resolved for writing,
    /// in which case nothing is written; store errors otherwise.
    #[instrument(skip(self, update))]
    pub async fn save_snapshot(&self, date: NaiveDate, update: &QuantityUpdate) -> Result<String> {
        let title = self.snapshot_title(date);

        if !self.snapshot_exists(date).await? {
            let master = self.store.read_rows(&self.ledger.master_sheet).await?;
            let master_columns = columns::resolve(master.header())?;
            let seed = seed_rows(&master, &master_columns);

            match self.store.create_sheet(&title, &seed).await {
                Ok(()) => info!("Created count sheet {title}"),
                Err(Error::SheetExists { .. }) => warn!("Count sheet {title} already existed"),
                Err(e) => return Err(e),
            }
            self.sheet_titles.invalidate().await;
        }

        let grid = self.store.read_rows(&title).await?;
        let columns = columns::resolve(grid.header())?;
        let writes = aggregate::aggregate(&grid, update, &columns)?;

        if writes.is_empty() {
            info!("Nothing to write for {title}");
        } else {
            self.store.write_cells(&title, &writes).await?;
        }
        Ok(title)
    }

    /// Appends catalog products missing from the master sheet.
    pub async fn import_catalog<C: ProductCatalog>(&self, source: &C) -> Result<ImportSummary> {
        let items = source.fetch_items().await?;
        let master = self.store.read_rows(&self.ledger.master_sheet).await?;
        let new_rows = catalog::merge_catalog_rows(&master, &items)?;

        let added = if new_rows.is_empty() {
            0
        } else {
            self.store
                .append_rows(&self.ledger.master_sheet, &new_rows)
                .await?
        };
        Ok(ImportSummary {
            fetched: items.len(),
            added,
        })
    }

    /// Claims `location` for `holder`; see [`LockRegistry::acquire`].
    pub fn acquire_lock(&self, location: &str, holder: &str) -> AcquireOutcome {
        self.locks.acquire(location, holder)
    }

    /// Releases `location`, returning whether a lock was removed.
    pub fn release_lock(&self, location: &str) -> bool {
        self.locks.release(location)
    }

    /// Live lock on `location`, if any.
    #[must_use]
    pub fn check_lock(&self, location: &str) -> Option<Lock> {
        self.locks.check(location)
    }

    /// Every live lock by location.
    #[must_use]
    pub fn list_locks(&self) -> BTreeMap<String, Lock> {
        self.locks.list_all()
    }
}

// Master rows with every quantity and total cell blanked.
fn seed_rows(master: &LedgerGrid, columns: &ColumnMap) -> Vec<Vec<String>> {
    master
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if index == 0 {
                return row.clone();
            }
            row.iter()
                .enumerate()
                .map(|(column, value)| {
                    if columns.is_quantity_column(column) {
                        String::new()
                    } else {
                        value.clone()
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::catalog::{CatalogItem, CatalogItemKind},
        errors::StructuralError,
        models::BucketKey,
        store::SeaOrmLedgerStore,
        test_utils::{MASTER_SHEET, rows, seed_master_sheet, setup_test_store},
    };

    async fn setup_service() -> Result<InventoryService<SeaOrmLedgerStore>> {
        let store = setup_test_store().await?;
        seed_master_sheet(&store).await?;
        Ok(InventoryService::new(store, &AppConfig::default()))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn location(id: &str) -> BucketKey {
        BucketKey::Location(id.to_string())
    }

    struct StaticCatalog(Vec<CatalogItem>);

    impl ProductCatalog for StaticCatalog {
        async fn fetch_items(&self) -> Result<Vec<CatalogItem>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_get_snapshot_without_saved_count_uses_template() -> Result<()> {
        let service = setup_service().await?;

        let view = service.get_snapshot(Some(day(1))).await?;
        assert!(!view.existing_inventory);
        assert_eq!(view.snapshot.mode, SnapshotMode::Template);
        assert_eq!(view.snapshot.date, Some(day(1)));

        let first = view.snapshot.bucket(&location("1")).unwrap();
        assert_eq!(first.entries[0].name, "Milk");
        assert_eq!(first.entries[0].current_quantity, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_load_saved_snapshot_missing_is_not_found() -> Result<()> {
        let service = setup_service().await?;
        let result = service.load_saved_snapshot(day(2)).await;
        assert!(matches!(result, Err(Error::SnapshotNotFound { date }) if date == day(2)));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_replay_round_trips_quantities() -> Result<()> {
        let service = setup_service().await?;
        let update = QuantityUpdate::new()
            .with("1", "Milk", "2.5")
            .with("2", "Butter", "0,25")
            .with("5", "Butter", "1");

        let title = service.save_snapshot(day(3), &update).await?;
        assert_eq!(title, "Інвентаризація 2025-03-03");

        let view = service.get_snapshot(Some(day(3))).await?;
        assert!(view.existing_inventory);
        assert_eq!(view.snapshot.mode, SnapshotMode::Replay);

        let milk = &view.snapshot.bucket(&location("1")).unwrap().entries[0];
        assert_eq!(milk.current_quantity, "2.5");
        assert_eq!(milk.saved_quantity, "2.5");
        let butter = &view.snapshot.bucket(&location("2")).unwrap().entries[0];
        assert_eq!(butter.current_quantity, "0.25");

        let grid = service.store().read_rows(&title).await?;
        assert_eq!(grid.cell(2, 9), "1.25");
        Ok(())
    }

    #[tokio::test]
    async fn test_dated_sheet_starts_with_blank_quantities() -> Result<()> {
        let service = setup_service().await?;
        let title = service.save_snapshot(day(4), &QuantityUpdate::new()).await?;

        let grid = service.store().read_rows(&title).await?;
        // Master has Milk = 9 in Холодильник 1 and a total; the copy must not.
        assert_eq!(grid.cell(1, 2), "Milk");
        assert_eq!(grid.cell(1, 6), "");
        assert_eq!(grid.cell(1, 9), "");
        assert_eq!(grid.header(), service.store().read_rows(MASTER_SHEET).await?.header());
        Ok(())
    }

    #[tokio::test]
    async fn test_creating_dated_sheet_refreshes_cached_titles() -> Result<()> {
        let service = setup_service().await?;

        // Warm the title cache while the count does not exist yet.
        assert!(!service.snapshot_exists(day(7)).await?);
        service
            .save_snapshot(day(7), &QuantityUpdate::new().with("1", "Milk", "3"))
            .await?;

        assert!(service.snapshot_exists(day(7)).await?);
        assert!(service.get_snapshot(Some(day(7))).await?.existing_inventory);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_save_keeps_earlier_locations() -> Result<()> {
        let service = setup_service().await?;
        service
            .save_snapshot(day(5), &QuantityUpdate::new().with("2", "Butter", "1"))
            .await?;
        let title = service
            .save_snapshot(day(5), &QuantityUpdate::new().with("5", "Butter", "2"))
            .await?;

        let grid = service.store().read_rows(&title).await?;
        assert_eq!(grid.cell(2, 7), "1");
        assert_eq!(grid.cell(2, 8), "2");
        assert_eq!(grid.cell(2, 9), "3");
        Ok(())
    }

    #[tokio::test]
    async fn test_save_against_master_without_locations_writes_nothing() -> Result<()> {
        let store = setup_test_store().await?;
        store
            .create_sheet(MASTER_SHEET, &rows(&[&["Назва", "Залишки"], &["Milk", ""]]))
            .await?;
        let service = InventoryService::new(store, &AppConfig::default());

        let result = service
            .save_snapshot(day(6), &QuantityUpdate::new().with("1", "Milk", "1"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::NoLocationColumns))
        ));
        assert!(!service.store().sheet_exists(&service.snapshot_title(day(6))).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_operations_delegate_to_registry() -> Result<()> {
        let service = setup_service().await?;

        assert!(service.acquire_lock("3", "alice").is_acquired());
        assert_eq!(service.acquire_lock("3", "bob").conflict_holder(), Some("alice"));
        assert_eq!(service.check_lock("3").unwrap().holder, "alice");
        assert_eq!(service.list_locks().len(), 1);

        assert!(service.release_lock("3"));
        assert!(!service.release_lock("3"));
        assert!(service.acquire_lock("3", "bob").is_acquired());
        Ok(())
    }

    #[tokio::test]
    async fn test_import_catalog_appends_new_products() -> Result<()> {
        let service = setup_service().await?;
        let source = StaticCatalog(vec![
            CatalogItem {
                id: "1".to_string(),
                name: "milk".to_string(),
                category: "Dairy".to_string(),
                kind: CatalogItemKind::Ingredient,
            },
            CatalogItem {
                id: "2".to_string(),
                name: "Honey".to_string(),
                category: "Sweet".to_string(),
                kind: CatalogItemKind::Prepack,
            },
        ]);

        let summary = service.import_catalog(&source).await?;
        assert_eq!(summary, ImportSummary { fetched: 2, added: 1 });

        let template = service.load_template().await?;
        let unassigned = template.bucket(&BucketKey::Unassigned).unwrap();
        assert!(unassigned.entries.iter().any(|e| e.name == "Honey" && e.kind == "Напівфабрикат"));

        // Importing again adds nothing.
        let summary = service.import_catalog(&source).await?;
        assert_eq!(summary.added, 0);
        Ok(())
    }
}
