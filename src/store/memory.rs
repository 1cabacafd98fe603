//! In-process store
//!
//! Holds all state behind a single `parking_lot::Mutex`, so the guarded
//! read-check-increment of a claim happens under one lock. Used by the test
//! suites and by local runs without `DATABASE_URL`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

use super::{NewPriceSample, PlatformStore, StoreError, cooldown_delta, daily_change_percent};
use crate::entities::p2p_trades::STATUS_COMPLETED;
use crate::models::claim::{
    AccountClaimState, AtomicClaimOutcome, ClaimCredit, ClaimRejection, GlobalSupply,
};
use crate::models::commission::{CommissionRecord, NewCommission};
use crate::models::price::{DailyPriceRecord, PriceSample};

#[derive(Debug, Clone)]
struct TradeRow {
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ClaimEventRow {
    account_id: Uuid,
    amount: Decimal,
}

#[derive(Debug, Default)]
struct MemoryState {
    supply: Option<GlobalSupply>,
    accounts: HashMap<Uuid, AccountClaimState>,
    claim_events: Vec<ClaimEventRow>,
    commissions: Vec<CommissionRecord>,
    trades: Vec<TradeRow>,
    prices: Vec<PriceSample>,
    daily: BTreeMap<NaiveDate, DailyPriceRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    commissions_unavailable: AtomicBool,
    claim_delay: Mutex<Option<Duration>>,
    supply_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only commission inserts fail
    pub fn set_commissions_unavailable(&self, unavailable: bool) {
        self.commissions_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay the atomic claim before it takes the lock
    pub fn set_claim_delay(&self, delay: Option<Duration>) {
        *self.claim_delay.lock() = delay;
    }

    /// Delay every supply read, as a hung database would
    pub fn set_supply_delay(&self, delay: Option<Duration>) {
        *self.supply_delay.lock() = delay;
    }

    /// Overwrite the issued total (seeding)
    pub fn set_total_claimed(&self, total_claimed: Decimal) {
        let mut state = self.state.lock();
        if let Some(supply) = state.supply.as_mut() {
            supply.total_claimed = total_claimed;
        }
    }

    /// Overwrite an account's last claim time (seeding)
    pub fn set_last_claim_time(&self, id: Uuid, last_claim_time: Option<DateTime<Utc>>) {
        if let Some(account) = self.state.lock().accounts.get_mut(&id) {
            account.last_claim_time = last_claim_time;
        }
    }

    /// Insert a trade row as the external trade flow would
    pub fn insert_trade(&self, status: &str, created_at: DateTime<Utc>) {
        self.state.lock().trades.push(TradeRow {
            status: status.to_string(),
            created_at,
        });
    }

    pub fn claim_event_count(&self, account_id: Uuid) -> usize {
        self.state
            .lock()
            .claim_events
            .iter()
            .filter(|e| e.account_id == account_id)
            .count()
    }

    /// Sum of all claim events; always equals the supply counter
    pub fn claimed_by_events(&self) -> Decimal {
        self.state.lock().claim_events.iter().map(|e| e.amount).sum()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

fn supply_of(state: &MemoryState) -> Result<GlobalSupply, StoreError> {
    state
        .supply
        .ok_or_else(|| StoreError::NotFound("global supply not initialized".to_string()))
}

#[async_trait]
impl PlatformStore for MemoryStore {
    async fn ensure_global_supply(&self, max_supply: Decimal) -> Result<GlobalSupply, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock();
        let supply = state.supply.get_or_insert(GlobalSupply {
            total_claimed: Decimal::ZERO,
            max_supply,
        });
        Ok(*supply)
    }

    async fn global_supply(&self) -> Result<GlobalSupply, StoreError> {
        self.check_available()?;
        let delay = *self.supply_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        supply_of(&self.state.lock())
    }

    async fn create_account(
        &self,
        id: Uuid,
        referred_by: Option<Uuid>,
    ) -> Result<AccountClaimState, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock();
        if state.accounts.contains_key(&id) {
            return Err(StoreError::Conflict(format!("account {} already exists", id)));
        }
        if let Some(referrer) = referred_by {
            if !state.accounts.contains_key(&referrer) {
                return Err(StoreError::NotFound(format!("referrer {}", referrer)));
            }
        }
        let account = AccountClaimState {
            id,
            last_claim_time: None,
            balance: Decimal::ZERO,
            referred_by,
        };
        state.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn account_claim_state(&self, id: Uuid) -> Result<Option<AccountClaimState>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().accounts.get(&id).cloned())
    }

    async fn atomic_claim(
        &self,
        id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<AtomicClaimOutcome, StoreError> {
        let delay = *self.claim_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;

        let mut state = self.state.lock();
        let supply = supply_of(&state)?;

        let Some(account) = state.accounts.get(&id).cloned() else {
            return Ok(AtomicClaimOutcome::Rejected(ClaimRejection::AccountNotFound));
        };

        if let Some(last_claim_time) = account.last_claim_time {
            if now.signed_duration_since(last_claim_time) < cooldown_delta(cooldown) {
                return Ok(AtomicClaimOutcome::Rejected(ClaimRejection::CooldownActive {
                    last_claim_time,
                }));
            }
        }

        if supply.would_overshoot(amount) {
            return Ok(AtomicClaimOutcome::Rejected(ClaimRejection::SupplyExhausted));
        }

        let new_supply = GlobalSupply {
            total_claimed: supply.total_claimed + amount,
            max_supply: supply.max_supply,
        };
        state.supply = Some(new_supply);

        let new_balance = account.balance + amount;
        if let Some(stored) = state.accounts.get_mut(&id) {
            stored.balance = new_balance;
            stored.last_claim_time = Some(now);
        }

        let event_id = Uuid::new_v4();
        state.claim_events.push(ClaimEventRow {
            account_id: id,
            amount,
        });

        Ok(AtomicClaimOutcome::Credited(ClaimCredit {
            event_id,
            claimed_amount: amount,
            new_balance,
            global_claimed: new_supply.total_claimed,
            global_remaining: new_supply.remaining(),
            referred_by: account.referred_by,
        }))
    }

    async fn credit_balance(&self, id: Uuid, amount: Decimal) -> Result<Decimal, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock();
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;
        account.balance += amount;
        Ok(account.balance)
    }

    async fn record_commission(&self, commission: NewCommission) -> Result<bool, StoreError> {
        self.check_available()?;
        if self.commissions_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commission ledger disabled".to_string()));
        }
        let mut state = self.state.lock();
        let duplicate = state.commissions.iter().any(|c| {
            c.source_event_id == commission.source_event_id
                && c.commission_type == commission.commission_type
        });
        if duplicate {
            return Ok(false);
        }
        state.commissions.push(CommissionRecord {
            id: Uuid::new_v4(),
            referrer_id: commission.referrer_id,
            referred_user_id: commission.referred_user_id,
            source_event_id: commission.source_event_id,
            amount: commission.amount,
            commission_type: commission.commission_type,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn commissions_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<CommissionRecord>, StoreError> {
        self.check_available()?;
        let mut records: Vec<CommissionRecord> = self
            .state
            .lock()
            .commissions
            .iter()
            .filter(|c| c.referrer_id == referrer_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn count_accounts(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().accounts.len() as u64)
    }

    async fn count_completed_trades(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .trades
            .iter()
            .filter(|t| t.status == STATUS_COMPLETED)
            .count() as u64)
    }

    async fn count_trades_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .trades
            .iter()
            .filter(|t| t.created_at >= since)
            .count() as u64)
    }

    async fn latest_price(&self) -> Result<Option<PriceSample>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .prices
            .iter()
            .max_by_key(|p| p.observed_at)
            .cloned())
    }

    async fn price_at_or_before(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<PriceSample>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .prices
            .iter()
            .filter(|p| p.observed_at <= at)
            .max_by_key(|p| p.observed_at)
            .cloned())
    }

    async fn recent_prices(&self, limit: u64) -> Result<Vec<PriceSample>, StoreError> {
        self.check_available()?;
        let mut prices = self.state.lock().prices.clone();
        prices.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
        prices.truncate(limit as usize);
        Ok(prices)
    }

    async fn append_price_sample(&self, sample: NewPriceSample) -> Result<PriceSample, StoreError> {
        self.check_available()?;
        let stored = PriceSample {
            price: sample.price,
            change_percent: sample.change_percent,
            strategy: sample.strategy,
            observed_at: sample.observed_at,
        };
        self.state.lock().prices.push(stored.clone());
        Ok(stored)
    }

    async fn upsert_daily_price(
        &self,
        date: NaiveDate,
        closing_price: Decimal,
    ) -> Result<DailyPriceRecord, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock();
        let record = state
            .daily
            .entry(date)
            .and_modify(|record| {
                record.closing_price = closing_price;
                record.daily_change_percent =
                    daily_change_percent(record.opening_price, closing_price);
            })
            .or_insert_with(|| DailyPriceRecord {
                date,
                opening_price: closing_price,
                closing_price,
                daily_change_percent: Decimal::ZERO,
            });
        Ok(record.clone())
    }

    async fn daily_prices(&self, limit: u64) -> Result<Vec<DailyPriceRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .daily
            .values()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use rust_decimal_macros::dec;

    const COOLDOWN: Duration = Duration::from_secs(10_800);

    async fn store_with_account() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        store.ensure_global_supply(dec!(200000)).await.unwrap();
        let id = Uuid::new_v4();
        store.create_account(id, None).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_ensure_global_supply_keeps_existing_ceiling() {
        let store = MemoryStore::new();
        store.ensure_global_supply(dec!(100)).await.unwrap();
        let supply = store.ensure_global_supply(dec!(500)).await.unwrap();
        assert_eq!(supply.max_supply, dec!(100));
    }

    #[tokio::test]
    async fn test_atomic_claim_credits_account_and_counter() {
        let (store, id) = store_with_account().await;
        let now = Utc::now();

        let outcome = store.atomic_claim(id, dec!(3), now, COOLDOWN).await.unwrap();
        let AtomicClaimOutcome::Credited(credit) = outcome else {
            panic!("expected credit, got {:?}", outcome);
        };
        assert_eq!(credit.new_balance, dec!(3));
        assert_eq!(credit.global_claimed, dec!(3));
        assert_eq!(credit.global_remaining, dec!(199997));

        let account = store.account_claim_state(id).await.unwrap().unwrap();
        assert_eq!(account.last_claim_time, Some(now));
        assert_eq!(store.claim_event_count(id), 1);
    }

    #[tokio::test]
    async fn test_atomic_claim_rechecks_cooldown() {
        let (store, id) = store_with_account().await;
        let now = Utc::now();
        store.atomic_claim(id, dec!(3), now, COOLDOWN).await.unwrap();

        let outcome = store
            .atomic_claim(id, dec!(3), now + ChronoDuration::hours(1), COOLDOWN)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AtomicClaimOutcome::Rejected(ClaimRejection::CooldownActive { last_claim_time: now })
        );
        assert_eq!(store.global_supply().await.unwrap().total_claimed, dec!(3));
    }

    #[tokio::test]
    async fn test_atomic_claim_refuses_overshoot() {
        let (store, id) = store_with_account().await;
        store.set_total_claimed(dec!(199998));

        let outcome = store.atomic_claim(id, dec!(3), Utc::now(), COOLDOWN).await.unwrap();
        assert_eq!(outcome, AtomicClaimOutcome::Rejected(ClaimRejection::SupplyExhausted));
        let account = store.account_claim_state(id).await.unwrap().unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(account.last_claim_time.is_none());
    }

    #[tokio::test]
    async fn test_atomic_claim_unknown_account() {
        let (store, _) = store_with_account().await;
        let outcome = store
            .atomic_claim(Uuid::new_v4(), dec!(3), Utc::now(), COOLDOWN)
            .await
            .unwrap();
        assert_eq!(outcome, AtomicClaimOutcome::Rejected(ClaimRejection::AccountNotFound));
    }

    #[tokio::test]
    async fn test_create_account_requires_existing_referrer() {
        let (store, id) = store_with_account().await;
        let missing = store.create_account(Uuid::new_v4(), Some(Uuid::new_v4())).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));

        let duplicate = store.create_account(id, None).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_record_commission_dedups_per_event() {
        let (store, id) = store_with_account().await;
        let commission = NewCommission {
            referrer_id: id,
            referred_user_id: Uuid::new_v4(),
            source_event_id: Uuid::new_v4(),
            amount: dec!(0.225),
            commission_type: crate::models::commission::CommissionType::ClaimCommission,
        };
        assert!(store.record_commission(commission.clone()).await.unwrap());
        assert!(!store.record_commission(commission).await.unwrap());
        assert_eq!(store.commissions_for_referrer(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_daily_price_keeps_opening() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let first = store.upsert_daily_price(date, dec!(2.00)).await.unwrap();
        assert_eq!(first.opening_price, dec!(2.00));
        assert_eq!(first.daily_change_percent, Decimal::ZERO);

        let second = store.upsert_daily_price(date, dec!(2.50)).await.unwrap();
        assert_eq!(second.opening_price, dec!(2.00));
        assert_eq!(second.closing_price, dec!(2.50));
        assert_eq!(second.daily_change_percent, dec!(25));
    }

    #[tokio::test]
    async fn test_trade_counts() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_trade("completed", now - ChronoDuration::hours(3));
        store.insert_trade("completed", now - ChronoDuration::minutes(10));
        store.insert_trade("pending", now - ChronoDuration::minutes(5));

        assert_eq!(store.count_completed_trades().await.unwrap(), 2);
        assert_eq!(
            store.count_trades_since(now - ChronoDuration::hours(1)).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.count_accounts().await, Err(StoreError::Unavailable(_))));
        assert!(store.latest_price().await.is_err());
    }
}
