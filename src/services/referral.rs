//! Referral commissions
//!
//! Runs after a credited claim and is not part of the claim's transaction:
//! a failure here leaves the claim in place and the commission unpaid.
//! Every payout writes one commission row keyed by the claim event (zero
//! when no price is known), so replaying the payout for the same event
//! records and credits nothing.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClaimConfig;
use crate::models::claim::ClaimCredit;
use crate::models::commission::{CommissionListResponse, CommissionType, NewCommission};
use crate::store::{PlatformStore, StoreError, with_timeout};

/// What was paid to a referrer for one claim
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralPayout {
    pub referrer_id: Uuid,
    /// Fiat commission recorded; None when no price was known
    pub commission: Option<Decimal>,
    pub bonus: Decimal,
}

pub struct ReferralService {
    store: Arc<dyn PlatformStore>,
    claim_amount: Decimal,
    commission_rate: Decimal,
    referrer_bonus: Decimal,
    timeout: Duration,
}

impl ReferralService {
    pub fn new(store: Arc<dyn PlatformStore>, config: &ClaimConfig) -> Self {
        Self {
            store,
            claim_amount: config.claim_amount,
            commission_rate: config.commission_rate,
            referrer_bonus: config.referrer_bonus,
            timeout: config.external_timeout,
        }
    }

    /// `claim_amount * price * rate`
    pub fn claim_commission(&self, price: Decimal) -> Decimal {
        (self.claim_amount * price * self.commission_rate).normalize()
    }

    /// Pay the referrer of `referee` for the credited claim.
    ///
    /// Returns None when the account has no referrer or when this event was
    /// already paid.
    pub async fn pay_claim_commission(
        &self,
        referee: Uuid,
        credit: &ClaimCredit,
    ) -> Result<Option<ReferralPayout>, StoreError> {
        let Some(referrer_id) = credit.referred_by else {
            return Ok(None);
        };

        let latest = with_timeout(self.timeout, self.store.latest_price()).await?;

        // Without a price the row is still written, at zero, so the bonus
        // below stays keyed to the event.
        let commission = latest.map(|sample| self.claim_commission(sample.price));
        if commission.is_none() {
            warn!(referrer_id = %referrer_id, "No price data, recording zero claim commission");
        }

        let recorded = with_timeout(
            self.timeout,
            self.store.record_commission(NewCommission {
                referrer_id,
                referred_user_id: referee,
                source_event_id: credit.event_id,
                amount: commission.unwrap_or(Decimal::ZERO),
                commission_type: CommissionType::ClaimCommission,
            }),
        )
        .await?;

        if !recorded {
            debug!(event_id = %credit.event_id, "Commission already recorded for claim event");
            return Ok(None);
        }

        let balance = with_timeout(
            self.timeout,
            self.store.credit_balance(referrer_id, self.referrer_bonus),
        )
        .await?;

        info!(
            referrer_id = %referrer_id,
            referee = %referee,
            event_id = %credit.event_id,
            commission = ?commission,
            bonus = %self.referrer_bonus,
            referrer_balance = %balance,
            "Referral payout"
        );

        Ok(Some(ReferralPayout {
            referrer_id,
            commission,
            bonus: self.referrer_bonus,
        }))
    }

    pub async fn commissions_for(
        &self,
        referrer_id: Uuid,
    ) -> Result<CommissionListResponse, StoreError> {
        let records = with_timeout(
            self.timeout,
            self.store.commissions_for_referrer(referrer_id),
        )
        .await?;
        let total_amount = records.iter().map(|r| r.amount).sum();

        Ok(CommissionListResponse {
            referrer_id,
            total_amount,
            records,
        })
    }
}
