//! `SeaORM` Entity for accounts table
//!
//! Only the claim-relevant subset of a user profile lives here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((30, 8)))")]
    pub balance: Decimal,
    /// Set by the atomic claim, nothing else writes it
    pub last_claim_time: Option<DateTimeWithTimeZone>,
    /// Immutable after registration
    pub referred_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
