use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_price_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub opening_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub closing_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 6)))")]
    pub daily_change_percent: Decimal,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
