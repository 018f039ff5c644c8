//! Ledger persistence - the contract the inventory service writes through, and
//! its `SeaORM` implementation.
//!
//! A ledger is a set of titled sheets. Each sheet is read as a whole grid of
//! text cells and written as batches of individual cells.

use crate::{
    entities::{Cell, Sheet, cell, sheet},
    errors::{Error, Result},
    models::{CellWrite, LedgerGrid},
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::future::Future;
use tracing::{debug, info, instrument};

// Four bound parameters per cell keeps each insert well under SQLite's limit.
const INSERT_CHUNK: usize = 200;

/// Read/write contract of the ledger backend.
pub trait LedgerStore: Send + Sync {
    /// Titles of every sheet, in creation order.
    fn sheet_titles(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Whether a sheet titled `title` exists.
    fn sheet_exists(&self, title: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Whole sheet, header first. Fails with [`Error::SheetNotFound`].
    fn read_rows(&self, title: &str) -> impl Future<Output = Result<LedgerGrid>> + Send;

    /// Applies every write or none of them.
    fn write_cells(
        &self,
        title: &str,
        cells: &[CellWrite],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Creates a sheet seeded with `rows`. Fails with [`Error::SheetExists`].
    fn create_sheet(
        &self,
        title: &str,
        rows: &[Vec<String>],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Appends `rows` below the last stored row and returns how many were added.
    fn append_rows(
        &self,
        title: &str,
        rows: &[Vec<String>],
    ) -> impl Future<Output = Result<usize>> + Send;
}

/// Sheet store backed by the `sheets` and `cells` tables.
#[derive(Debug, Clone)]
pub struct SeaOrmLedgerStore {
    db: DatabaseConnection,
}

impl SeaOrmLedgerStore {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

async fn find_sheet<C>(db: &C, title: &str) -> Result<Option<sheet::Model>>
where
    C: ConnectionTrait,
{
    Sheet::find()
        .filter(sheet::Column::Title.eq(title))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_sheet<C>(db: &C, title: &str) -> Result<sheet::Model>
where
    C: ConnectionTrait,
{
    find_sheet(db, title)
        .await?
        .ok_or_else(|| Error::SheetNotFound {
            title: title.to_string(),
        })
}

// Non-empty cells of `rows`, placed starting at `first_row`.
fn cell_models(
    sheet_id: i64,
    first_row: usize,
    rows: &[Vec<String>],
) -> Result<Vec<cell::ActiveModel>> {
    let mut models = Vec::new();
    for (offset, row) in rows.iter().enumerate() {
        let row_index = i64::try_from(first_row + offset)?;
        for (column, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            models.push(cell::ActiveModel {
                sheet_id: Set(sheet_id),
                row_index: Set(row_index),
                col_index: Set(i64::try_from(column)?),
                value: Set(value.clone()),
                ..Default::default()
            });
        }
    }
    Ok(models)
}

async fn insert_cells<C>(db: &C, models: Vec<cell::ActiveModel>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let chunk: Vec<cell::ActiveModel> = models.by_ref().take(INSERT_CHUNK).collect();
        Cell::insert_many(chunk).exec(db).await?;
    }
    Ok(())
}

impl LedgerStore for SeaOrmLedgerStore {
    async fn sheet_titles(&self) -> Result<Vec<String>> {
        let sheets = Sheet::find()
            .order_by_asc(sheet::Column::Id)
            .all(&self.db)
            .await?;
        Ok(sheets.into_iter().map(|s| s.title).collect())
    }

    async fn sheet_exists(&self, title: &str) -> Result<bool> {
        Ok(find_sheet(&self.db, title).await?.is_some())
    }

    #[instrument(skip(self))]
    async fn read_rows(&self, title: &str) -> Result<LedgerGrid> {
        let sheet = require_sheet(&self.db, title).await?;
        let cells = Cell::find()
            .filter(cell::Column::SheetId.eq(sheet.id))
            .order_by_asc(cell::Column::RowIndex)
            .order_by_asc(cell::Column::ColIndex)
            .all(&self.db)
            .await?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for cell in cells {
            let row = usize::try_from(cell.row_index)?;
            let column = usize::try_from(cell.col_index)?;
            if rows.len() <= row {
                rows.resize_with(row + 1, Vec::new);
            }
            let cells_in_row = &mut rows[row];
            if cells_in_row.len() <= column {
                cells_in_row.resize(column + 1, String::new());
            }
            cells_in_row[column] = cell.value;
        }

        debug!("Read {} rows from sheet {title}", rows.len());
        Ok(LedgerGrid::new(rows))
    }

    #[instrument(skip(self, cells), fields(count = cells.len()))]
    async fn write_cells(&self, title: &str, cells: &[CellWrite]) -> Result<()> {
        let txn = self.db.begin().await?;
        let sheet = require_sheet(&txn, title).await?;

        for write in cells {
            let row_index = i64::try_from(write.address.row)?;
            let col_index = i64::try_from(write.address.column)?;

            let existing = Cell::find()
                .filter(cell::Column::SheetId.eq(sheet.id))
                .filter(cell::Column::RowIndex.eq(row_index))
                .filter(cell::Column::ColIndex.eq(col_index))
                .one(&txn)
                .await?;

            if let Some(model) = existing {
                let mut active: cell::ActiveModel = model.into();
                active.value = Set(write.value.clone());
                active.update(&txn).await?;
            } else if !write.value.is_empty() {
                cell::ActiveModel {
                    sheet_id: Set(sheet.id),
                    row_index: Set(row_index),
                    col_index: Set(col_index),
                    value: Set(write.value.clone()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;
        info!("Wrote {} cells to sheet {title}", cells.len());
        Ok(())
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn create_sheet(&self, title: &str, rows: &[Vec<String>]) -> Result<()> {
        let txn = self.db.begin().await?;
        if find_sheet(&txn, title).await?.is_some() {
            return Err(Error::SheetExists {
                title: title.to_string(),
            });
        }

        let sheet = sheet::ActiveModel {
            title: Set(title.to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_cells(&txn, cell_models(sheet.id, 0, rows)?).await?;
        txn.commit().await?;
        info!("Created sheet {title}");
        Ok(())
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn append_rows(&self, title: &str, rows: &[Vec<String>]) -> Result<usize> {
        let txn = self.db.begin().await?;
        let sheet = require_sheet(&txn, title).await?;

        let last = Cell::find()
            .filter(cell::Column::SheetId.eq(sheet.id))
            .order_by_desc(cell::Column::RowIndex)
            .one(&txn)
            .await?;
        let first_row = match last {
            Some(cell) => usize::try_from(cell.row_index)? + 1,
            None => 0,
        };

        insert_cells(&txn, cell_models(sheet.id, first_row, rows)?).await?;
        txn.commit().await?;
        info!("Appended {} rows to sheet {title}", rows.len());
        Ok(rows.len())
    }
}
