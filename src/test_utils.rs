//! Shared test utilities.
//!
//! Helpers for setting up an in-memory sheet store and seeding it with a small
//! master ledger.

use crate::{
    errors::Result,
    store::{LedgerStore, SeaOrmLedgerStore},
};
use sea_orm::DatabaseConnection;

/// Title of the master sheet under the default configuration.
pub const MASTER_SHEET: &str = "Лист1";

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an empty sheet store over a fresh in-memory database.
pub async fn setup_test_store() -> Result<SeaOrmLedgerStore> {
    Ok(SeaOrmLedgerStore::new(setup_test_db().await?))
}

/// Turns string literals into owned rows.
#[must_use]
pub fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect()
}

/// Master ledger used across service tests.
///
/// Columns: 0 fridge field, 1 shelf field, 2 name, 3 category, 4 type, 5 unit,
/// 6 `Холодильник 1`, 7 `Холодильник 2`, 8 `Стелаж 5`, 9 total.
#[must_use]
pub fn master_rows() -> Vec<Vec<String>> {
    rows(&[
        &[
            "Холодильник",
            "Стелаж",
            "Назва",
            "Категорія",
            "Тип",
            "Одиниці виміру",
            "Холодильник 1",
            "Холодильник 2",
            "Стелаж 5",
            "Залишки",
        ],
        &["1", "", "Milk", "Dairy", "Інгредієнт", "л", "9", "", "", "9"],
        &["2", "5", "Butter", "Dairy", "Інгредієнт", "", "", "", "", ""],
        &["", "", "Salt", "Dry", "Інгредієнт", "", "", "", "", ""],
    ])
}

/// Seeds [`MASTER_SHEET`] with [`master_rows`].
pub async fn seed_master_sheet(store: &SeaOrmLedgerStore) -> Result<()> {
    store.create_sheet(MASTER_SHEET, &master_rows()).await
}
