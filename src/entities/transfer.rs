use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single movement between two bases; one row feeds both sides of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_base_id: String,
    pub to_base_id: String,
    pub asset_type: String,
    pub quantity: Option<i64>,
    pub recorded_by: String,
    pub date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
