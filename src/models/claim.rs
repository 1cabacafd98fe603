//! Claim gate domain types and the claim/account endpoint payloads

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform-wide issuance counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSupply {
    pub total_claimed: Decimal,
    pub max_supply: Decimal,
}

impl GlobalSupply {
    pub fn remaining(&self) -> Decimal {
        (self.max_supply - self.total_claimed).max(Decimal::ZERO)
    }

    /// True when crediting `amount` would push the total past the ceiling
    pub fn would_overshoot(&self, amount: Decimal) -> bool {
        self.total_claimed + amount > self.max_supply
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_claimed >= self.max_supply
    }
}

/// Claim-relevant subset of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountClaimState {
    pub id: Uuid,
    pub last_claim_time: Option<DateTime<Utc>>,
    pub balance: Decimal,
    pub referred_by: Option<Uuid>,
}

/// Values returned by the store after a credited claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimCredit {
    pub event_id: Uuid,
    pub claimed_amount: Decimal,
    pub new_balance: Decimal,
    pub global_claimed: Decimal,
    pub global_remaining: Decimal,
    pub referred_by: Option<Uuid>,
}

/// Why the store refused to credit a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRejection {
    AccountNotFound,
    SupplyExhausted,
    CooldownActive { last_claim_time: DateTime<Utc> },
}

/// Outcome of the store's atomic claim
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicClaimOutcome {
    Credited(ClaimCredit),
    Rejected(ClaimRejection),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub can_claim: bool,
    pub remaining_cooldown_ms: i64,
    pub global_limit_reached: bool,
}

impl Eligibility {
    pub fn denied() -> Self {
        Self {
            can_claim: false,
            remaining_cooldown_ms: 0,
            global_limit_reached: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub success: bool,
    pub claimed_amount: Decimal,
    pub new_balance: Decimal,
    pub global_claimed: Decimal,
    pub global_remaining: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_commission: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyResponse {
    pub total_claimed: Decimal,
    pub max_supply: Decimal,
    pub remaining: Decimal,
}

impl From<GlobalSupply> for SupplyResponse {
    fn from(supply: GlobalSupply) -> Self {
        Self {
            total_claimed: supply.total_claimed,
            max_supply: supply.max_supply,
            remaining: supply.remaining(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccountRequest {
    pub referred_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub balance: Decimal,
    pub last_claim_time: Option<DateTime<Utc>>,
    pub referred_by: Option<Uuid>,
}

impl From<AccountClaimState> for AccountResponse {
    fn from(account: AccountClaimState) -> Self {
        Self {
            id: account.id,
            balance: account.balance,
            last_claim_time: account.last_claim_time,
            referred_by: account.referred_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_supply_overshoot_boundary() {
        let supply = GlobalSupply {
            total_claimed: dec!(199997),
            max_supply: dec!(200000),
        };
        assert!(!supply.would_overshoot(dec!(3)));
        assert!(supply.would_overshoot(dec!(3.00000001)));
        assert_eq!(supply.remaining(), dec!(3));
        assert!(!supply.is_exhausted());
    }

    #[test]
    fn test_eligibility_serializes_camel_case() {
        let json = serde_json::to_value(Eligibility {
            can_claim: false,
            remaining_cooldown_ms: 3_600_000,
            global_limit_reached: false,
        })
        .unwrap();
        assert_eq!(json["canClaim"], false);
        assert_eq!(json["remainingCooldownMs"], 3_600_000);
        assert_eq!(json["globalLimitReached"], false);
    }
}
