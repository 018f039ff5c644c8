//! Sheet entity - one named tab of the ledger (the master list or a dated count).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sheet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sheets")]
pub struct Model {
    /// Unique identifier for the sheet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sheet title, e.g. `"Лист1"` or `"Інвентаризація 2025-03-01"`
    #[sea_orm(unique)]
    pub title: String,
    /// When the sheet was created
    pub created_at: DateTime,
}

/// Defines relationships between Sheet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One sheet has many cells
    #[sea_orm(has_many = "super::cell::Entity")]
    Cells,
}

impl Related<super::cell::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
