//! Persistence seam for the price oracle and the claim gate
//!
//! Both components are stateless; everything they read or write goes through
//! [`PlatformStore`]. [`SeaOrmStore`] backs production on Postgres and
//! [`MemoryStore`] keeps the same guarantees in-process.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;

use crate::models::claim::{AccountClaimState, AtomicClaimOutcome, GlobalSupply};
use crate::models::commission::{CommissionRecord, NewCommission};
use crate::models::price::{DailyPriceRecord, PriceSample};

pub mod memory;
pub mod sea_orm_store;

pub use memory::MemoryStore;
pub use sea_orm_store::SeaOrmStore;

#[derive(Debug)]
pub enum StoreError {
    Database(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Timeout,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Timeout => write!(f, "timed out"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Price sample about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceSample {
    pub price: Decimal,
    pub change_percent: Decimal,
    pub strategy: String,
    pub observed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PlatformStore: Send + Sync {
    /// Create the supply singleton with `max_supply` if it does not exist yet.
    /// An existing ceiling is left untouched.
    async fn ensure_global_supply(&self, max_supply: Decimal) -> Result<GlobalSupply, StoreError>;

    async fn global_supply(&self) -> Result<GlobalSupply, StoreError>;

    /// Register a new account. `referred_by` is fixed from here on.
    async fn create_account(
        &self,
        id: Uuid,
        referred_by: Option<Uuid>,
    ) -> Result<AccountClaimState, StoreError>;

    async fn account_claim_state(&self, id: Uuid) -> Result<Option<AccountClaimState>, StoreError>;

    /// Credit `amount` to the account and the global counter as one unit.
    ///
    /// Must re-check both the cooldown and the ceiling under the same lock or
    /// transaction that performs the increments; this is what keeps
    /// `total_claimed <= max_supply` under concurrent claimants.
    async fn atomic_claim(
        &self,
        id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<AtomicClaimOutcome, StoreError>;

    /// Add a flat bonus to an account balance
    async fn credit_balance(&self, id: Uuid, amount: Decimal) -> Result<Decimal, StoreError>;

    /// Append a commission. Returns false when one already exists for the same
    /// source event and type.
    async fn record_commission(&self, commission: NewCommission) -> Result<bool, StoreError>;

    async fn commissions_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<CommissionRecord>, StoreError>;

    async fn count_accounts(&self) -> Result<u64, StoreError>;

    async fn count_completed_trades(&self) -> Result<u64, StoreError>;

    /// Trades created at or after `since`, any status
    async fn count_trades_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn latest_price(&self) -> Result<Option<PriceSample>, StoreError>;

    /// Newest sample observed at or before `at`
    async fn price_at_or_before(&self, at: DateTime<Utc>)
    -> Result<Option<PriceSample>, StoreError>;

    /// Newest first
    async fn recent_prices(&self, limit: u64) -> Result<Vec<PriceSample>, StoreError>;

    async fn append_price_sample(&self, sample: NewPriceSample) -> Result<PriceSample, StoreError>;

    /// Create the record for `date` (open = close = price, change 0) or update
    /// its close and change relative to the untouched open.
    async fn upsert_daily_price(
        &self,
        date: NaiveDate,
        closing_price: Decimal,
    ) -> Result<DailyPriceRecord, StoreError>;

    /// Newest first
    async fn daily_prices(&self, limit: u64) -> Result<Vec<DailyPriceRecord>, StoreError>;
}

/// Bound a store call by `limit`
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

/// Cooldown as a chrono delta; saturates instead of failing on absurd values
pub(crate) fn cooldown_delta(cooldown: Duration) -> chrono::Duration {
    chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX)
}

/// Percent change of `closing` against `opening`, zero when the open is zero
pub fn daily_change_percent(opening: Decimal, closing: Decimal) -> Decimal {
    if opening.is_zero() {
        return Decimal::ZERO;
    }
    ((closing - opening) / opening * Decimal::ONE_HUNDRED).round_dp(6)
}
