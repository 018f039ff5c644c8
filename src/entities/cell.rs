//! Cell entity - the text stored at one (row, column) of a sheet.
//!
//! Only cells that were ever written are stored. Missing cells read as blank.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cell database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cells")]
pub struct Model {
    /// Unique identifier for the cell
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sheet this cell belongs to
    pub sheet_id: i64,
    /// Zero-based row, the header is row 0
    pub row_index: i64,
    /// Zero-based column
    pub col_index: i64,
    /// Cell text; empty means cleared
    pub value: String,
}

/// Defines relationships between Cell and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each cell belongs to one sheet
    #[sea_orm(
        belongs_to = "super::sheet::Entity",
        from = "Column::SheetId",
        to = "super::sheet::Column::Id"
    )]
    Sheet,
}

impl Related<super::sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sheet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
