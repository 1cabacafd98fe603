//! Claim/Cooldown Gate
//!
//! Per-account claim state is derived from the account's last claim time and
//! the global supply counter:
//!
//! ```text
//! NeverClaimed ──claim──> CoolingDown ──cooldown elapsed──> Claimable ──claim──> CoolingDown
//!        any state ──total_claimed + amount > max_supply──> SupplyExhausted
//! ```
//!
//! The checks done here are only a fast path for callers. The ceiling is
//! enforced by [`PlatformStore::atomic_claim`], which re-checks cooldown and
//! supply in the same unit of work that performs the credit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ClaimConfig;
use crate::models::claim::{
    AtomicClaimOutcome, ClaimReceipt, ClaimRejection, Eligibility, GlobalSupply,
};
use crate::services::referral::ReferralService;
use crate::store::{PlatformStore, StoreError, with_timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    NeverClaimed,
    CoolingDown { remaining_ms: i64 },
    Claimable,
    SupplyExhausted,
}

impl ClaimState {
    pub fn evaluate(
        last_claim_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cooldown: Duration,
        supply: &GlobalSupply,
        claim_amount: Decimal,
    ) -> Self {
        if supply.is_exhausted() || supply.would_overshoot(claim_amount) {
            return ClaimState::SupplyExhausted;
        }

        match last_claim_time {
            None => ClaimState::NeverClaimed,
            Some(_) => match remaining_cooldown_ms(last_claim_time, now, cooldown) {
                0 => ClaimState::Claimable,
                remaining_ms => ClaimState::CoolingDown { remaining_ms },
            },
        }
    }

    pub fn can_claim(&self) -> bool {
        matches!(self, ClaimState::NeverClaimed | ClaimState::Claimable)
    }
}

/// Milliseconds left before the next claim, in [0, cooldown]
pub fn remaining_cooldown_ms(
    last_claim_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> i64 {
    let Some(last) = last_claim_time else {
        return 0;
    };
    let cooldown_ms = i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX);
    let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
    cooldown_ms.saturating_sub(elapsed_ms).clamp(0, cooldown_ms)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClaimError {
    NotAuthenticated,
    ProfileNotFound,
    GlobalSupplyExhausted,
    CooldownActive { remaining_ms: i64 },
    AtomicClaimFailed(String),
}

impl ClaimError {
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::NotAuthenticated => "NOT_AUTHENTICATED",
            ClaimError::ProfileNotFound => "PROFILE_NOT_FOUND",
            ClaimError::GlobalSupplyExhausted => "GLOBAL_SUPPLY_EXHAUSTED",
            ClaimError::CooldownActive { .. } => "COOLDOWN_ACTIVE",
            ClaimError::AtomicClaimFailed(_) => "ATOMIC_CLAIM_FAILED",
        }
    }

    fn from_store(err: StoreError) -> Self {
        ClaimError::AtomicClaimFailed(err.to_string())
    }
}

impl std::fmt::Display for ClaimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimError::NotAuthenticated => write!(f, "Not authenticated"),
            ClaimError::ProfileNotFound => write!(f, "Profile not found"),
            ClaimError::GlobalSupplyExhausted => write!(f, "Global token supply exhausted"),
            ClaimError::CooldownActive { remaining_ms } => {
                write!(f, "Claim cooldown active, {} ms remaining", remaining_ms)
            }
            ClaimError::AtomicClaimFailed(reason) => write!(f, "Claim failed: {}", reason),
        }
    }
}

impl std::error::Error for ClaimError {}

pub struct ClaimGate {
    store: Arc<dyn PlatformStore>,
    referrals: Arc<ReferralService>,
    config: ClaimConfig,
}

impl ClaimGate {
    pub fn new(
        store: Arc<dyn PlatformStore>,
        referrals: Arc<ReferralService>,
        config: ClaimConfig,
    ) -> Self {
        Self {
            store,
            referrals,
            config,
        }
    }

    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    pub async fn check_eligibility(&self, account: Option<Uuid>) -> Eligibility {
        self.check_eligibility_at(account, Utc::now()).await
    }

    /// Read-only; any failure yields a denied eligibility
    pub async fn check_eligibility_at(&self, account: Option<Uuid>, now: DateTime<Utc>) -> Eligibility {
        let Some(id) = account else {
            return Eligibility::denied();
        };
        let timeout = self.config.external_timeout;

        let supply = match with_timeout(timeout, self.store.global_supply()).await {
            Ok(supply) => supply,
            Err(e) => {
                warn!(account_id = %id, error = %e, "Eligibility check could not read supply");
                return Eligibility::denied();
            }
        };

        let account = match with_timeout(timeout, self.store.account_claim_state(id)).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(account_id = %id, "Eligibility check for unknown account");
                return Eligibility::denied();
            }
            Err(e) => {
                warn!(account_id = %id, error = %e, "Eligibility check could not read account");
                return Eligibility::denied();
            }
        };

        let state = ClaimState::evaluate(
            account.last_claim_time,
            now,
            self.config.cooldown,
            &supply,
            self.config.claim_amount,
        );
        let remaining_cooldown_ms =
            remaining_cooldown_ms(account.last_claim_time, now, self.config.cooldown);

        debug!(
            account_id = %id,
            state = ?state,
            remaining_ms = remaining_cooldown_ms,
            total_claimed = %supply.total_claimed,
            "Eligibility evaluated"
        );

        Eligibility {
            can_claim: state.can_claim(),
            remaining_cooldown_ms,
            global_limit_reached: state == ClaimState::SupplyExhausted,
        }
    }

    pub async fn perform_claim(&self, account: Option<Uuid>) -> Result<ClaimReceipt, ClaimError> {
        self.perform_claim_at(account, Utc::now()).await
    }

    pub async fn perform_claim_at(
        &self,
        account: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, ClaimError> {
        let id = account.ok_or(ClaimError::NotAuthenticated)?;
        let timeout = self.config.external_timeout;
        let amount = self.config.claim_amount;

        let supply = with_timeout(timeout, self.store.global_supply())
            .await
            .map_err(ClaimError::from_store)?;
        let state = with_timeout(timeout, self.store.account_claim_state(id))
            .await
            .map_err(ClaimError::from_store)?
            .ok_or(ClaimError::ProfileNotFound)?;

        match ClaimState::evaluate(state.last_claim_time, now, self.config.cooldown, &supply, amount) {
            ClaimState::SupplyExhausted => {
                info!(account_id = %id, total_claimed = %supply.total_claimed, max_supply = %supply.max_supply, "Claim refused, supply exhausted");
                return Err(ClaimError::GlobalSupplyExhausted);
            }
            ClaimState::CoolingDown { remaining_ms } => {
                info!(account_id = %id, remaining_ms, "Claim refused, cooldown active");
                return Err(ClaimError::CooldownActive { remaining_ms });
            }
            ClaimState::NeverClaimed | ClaimState::Claimable => {}
        }

        let outcome = with_timeout(
            timeout,
            self.store.atomic_claim(id, amount, now, self.config.cooldown),
        )
        .await
        .map_err(|e| {
            error!(account_id = %id, error = %e, "Atomic claim failed");
            ClaimError::from_store(e)
        })?;

        let credit = match outcome {
            AtomicClaimOutcome::Credited(credit) => credit,
            AtomicClaimOutcome::Rejected(ClaimRejection::AccountNotFound) => {
                return Err(ClaimError::ProfileNotFound);
            }
            AtomicClaimOutcome::Rejected(ClaimRejection::SupplyExhausted) => {
                info!(account_id = %id, "Claim lost the race for the last supply");
                return Err(ClaimError::GlobalSupplyExhausted);
            }
            AtomicClaimOutcome::Rejected(ClaimRejection::CooldownActive { last_claim_time }) => {
                let remaining_ms =
                    remaining_cooldown_ms(Some(last_claim_time), now, self.config.cooldown);
                info!(account_id = %id, remaining_ms, "Concurrent claim already credited");
                return Err(ClaimError::CooldownActive { remaining_ms });
            }
        };

        info!(
            account_id = %id,
            event_id = %credit.event_id,
            claimed_amount = %credit.claimed_amount,
            new_balance = %credit.new_balance,
            total_claimed = %credit.global_claimed,
            "Claim credited"
        );

        // The claim stands even if the payout fails
        let referral_commission = match self.referrals.pay_claim_commission(id, &credit).await {
            Ok(payout) => payout.and_then(|p| p.commission),
            Err(e) => {
                error!(account_id = %id, event_id = %credit.event_id, error = %e, "Referral payout failed after claim");
                None
            }
        };

        Ok(ClaimReceipt {
            success: true,
            claimed_amount: credit.claimed_amount,
            new_balance: credit.new_balance,
            global_claimed: credit.global_claimed,
            global_remaining: credit.global_remaining,
            referral_commission,
        })
    }
}
