//! `SeaORM` Entity for commission_records

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_user_id: Uuid,
    /// Claim event (or external trade) that triggered the payout
    pub source_event_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((30, 8)))")]
    pub amount: Decimal,
    /// 'claim_commission' or 'trade_commission'
    #[sea_orm(column_name = "type")]
    pub commission_type: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
