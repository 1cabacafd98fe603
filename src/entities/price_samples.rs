//! SeaORM Entity for the append-only price sample history

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_samples")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Price rounded to 2 decimal places
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub price: Decimal,
    /// Change relative to the preceding sample
    #[sea_orm(column_type = "Decimal(Some((20, 6)))")]
    pub change_percent: Decimal,
    /// Strategy that produced the sample: 'zirox' or 'gx'
    pub strategy: String,
    pub observed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
