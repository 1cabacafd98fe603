//! Referral commission types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    ClaimCommission,
    TradeCommission,
}

impl std::fmt::Display for CommissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionType::ClaimCommission => write!(f, "claim_commission"),
            CommissionType::TradeCommission => write!(f, "trade_commission"),
        }
    }
}

impl std::str::FromStr for CommissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claim_commission" => Ok(CommissionType::ClaimCommission),
            "trade_commission" => Ok(CommissionType::TradeCommission),
            _ => Err(format!("Unknown commission type: {}", s)),
        }
    }
}

/// Commission to append; `source_event_id` + `commission_type` is the dedup key
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommission {
    pub referrer_id: Uuid,
    pub referred_user_id: Uuid,
    pub source_event_id: Uuid,
    pub amount: Decimal,
    pub commission_type: CommissionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRecord {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_user_id: Uuid,
    pub source_event_id: Uuid,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub commission_type: CommissionType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionListResponse {
    pub referrer_id: Uuid,
    pub total_amount: Decimal,
    pub records: Vec<CommissionRecord>,
}
