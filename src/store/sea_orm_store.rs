//! SeaORM store (Postgres)
//!
//! The atomic claim is a single transaction with two guarded UPDATEs. Postgres
//! re-evaluates each WHERE clause after waiting on the row lock, so two
//! claimants racing the same pre-check cannot jointly overshoot the ceiling.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{NewPriceSample, PlatformStore, StoreError, cooldown_delta, daily_change_percent};
use crate::entities::{
    accounts, claim_events, commission_records, daily_price_records, global_supply, p2p_trades,
    price_samples,
};
use crate::models::claim::{
    AccountClaimState, AtomicClaimOutcome, ClaimCredit, ClaimRejection, GlobalSupply,
};
use crate::models::commission::{CommissionRecord, CommissionType, NewCommission};
use crate::models::price::{DailyPriceRecord, PriceSample};

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn to_supply(model: global_supply::Model) -> GlobalSupply {
    GlobalSupply {
        total_claimed: model.total_claimed,
        max_supply: model.max_supply,
    }
}

fn to_account(model: accounts::Model) -> AccountClaimState {
    AccountClaimState {
        id: model.id,
        last_claim_time: model.last_claim_time.map(|t| t.with_timezone(&Utc)),
        balance: model.balance,
        referred_by: model.referred_by,
    }
}

fn to_sample(model: price_samples::Model) -> PriceSample {
    PriceSample {
        price: model.price,
        change_percent: model.change_percent,
        strategy: model.strategy,
        observed_at: model.observed_at.with_timezone(&Utc),
    }
}

fn to_daily(model: daily_price_records::Model) -> DailyPriceRecord {
    DailyPriceRecord {
        date: model.date,
        opening_price: model.opening_price,
        closing_price: model.closing_price,
        daily_change_percent: model.daily_change_percent,
    }
}

fn to_commission(model: commission_records::Model) -> Result<CommissionRecord, StoreError> {
    let commission_type = model
        .commission_type
        .parse::<CommissionType>()
        .map_err(StoreError::Database)?;
    Ok(CommissionRecord {
        id: model.id,
        referrer_id: model.referrer_id,
        referred_user_id: model.referred_user_id,
        source_event_id: model.source_event_id,
        amount: model.amount,
        commission_type,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl PlatformStore for SeaOrmStore {
    async fn ensure_global_supply(&self, max_supply: Decimal) -> Result<GlobalSupply, StoreError> {
        let seed = global_supply::ActiveModel {
            id: Set(global_supply::SINGLETON_ID),
            total_claimed: Set(Decimal::ZERO),
            max_supply: Set(max_supply),
            updated_at: Set(Utc::now().fixed_offset()),
        };

        let inserted = global_supply::Entity::insert(seed)
            .on_conflict(
                OnConflict::column(global_supply::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted > 0 {
            debug!(max_supply = %max_supply, "Seeded global supply");
        }

        self.global_supply().await
    }

    async fn global_supply(&self) -> Result<GlobalSupply, StoreError> {
        global_supply::Entity::find_by_id(global_supply::SINGLETON_ID)
            .one(&self.db)
            .await?
            .map(to_supply)
            .ok_or_else(|| StoreError::NotFound("global supply not initialized".to_string()))
    }

    async fn create_account(
        &self,
        id: Uuid,
        referred_by: Option<Uuid>,
    ) -> Result<AccountClaimState, StoreError> {
        let txn = self.db.begin().await?;

        if accounts::Entity::find_by_id(id).one(&txn).await?.is_some() {
            return Err(StoreError::Conflict(format!("account {} already exists", id)));
        }

        if let Some(referrer) = referred_by {
            if accounts::Entity::find_by_id(referrer).one(&txn).await?.is_none() {
                return Err(StoreError::NotFound(format!("referrer {}", referrer)));
            }
        }

        let account = accounts::ActiveModel {
            id: Set(id),
            balance: Set(Decimal::ZERO),
            last_claim_time: Set(None),
            referred_by: Set(referred_by),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(to_account(account))
    }

    async fn account_claim_state(&self, id: Uuid) -> Result<Option<AccountClaimState>, StoreError> {
        Ok(accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(to_account))
    }

    async fn atomic_claim(
        &self,
        id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<AtomicClaimOutcome, StoreError> {
        let claimed_at = now.fixed_offset();
        let cutoff = now
            .checked_sub_signed(cooldown_delta(cooldown))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .fixed_offset();

        let txn = self.db.begin().await?;

        if global_supply::Entity::find_by_id(global_supply::SINGLETON_ID)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound("global supply not initialized".to_string()));
        }

        // Cooldown guard: only an account whose last claim is old enough matches
        let account_update = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount),
            )
            .col_expr(accounts::Column::LastClaimTime, Expr::value(claimed_at))
            .filter(accounts::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(accounts::Column::LastClaimTime.is_null())
                    .add(accounts::Column::LastClaimTime.lte(cutoff)),
            )
            .exec(&txn)
            .await?;

        if account_update.rows_affected == 0 {
            let existing = accounts::Entity::find_by_id(id).one(&txn).await?;
            txn.rollback().await?;
            return match existing.and_then(|a| a.last_claim_time) {
                Some(last) => Ok(AtomicClaimOutcome::Rejected(ClaimRejection::CooldownActive {
                    last_claim_time: last.with_timezone(&Utc),
                })),
                None => Ok(AtomicClaimOutcome::Rejected(ClaimRejection::AccountNotFound)),
            };
        }

        // Ceiling guard: total_claimed + amount <= max_supply
        let supply_update = global_supply::Entity::update_many()
            .col_expr(
                global_supply::Column::TotalClaimed,
                Expr::col(global_supply::Column::TotalClaimed).add(amount),
            )
            .col_expr(global_supply::Column::UpdatedAt, Expr::value(claimed_at))
            .filter(global_supply::Column::Id.eq(global_supply::SINGLETON_ID))
            .filter(
                Expr::col(global_supply::Column::TotalClaimed)
                    .lte(Expr::col(global_supply::Column::MaxSupply).sub(amount)),
            )
            .exec(&txn)
            .await?;

        if supply_update.rows_affected == 0 {
            txn.rollback().await?;
            warn!(account_id = %id, amount = %amount, "Atomic claim refused by supply ceiling");
            return Ok(AtomicClaimOutcome::Rejected(ClaimRejection::SupplyExhausted));
        }

        let event = claim_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(id),
            amount: Set(amount),
            claimed_at: Set(claimed_at),
        }
        .insert(&txn)
        .await?;

        let account = accounts::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;
        let supply = global_supply::Entity::find_by_id(global_supply::SINGLETON_ID)
            .one(&txn)
            .await?
            .map(to_supply)
            .ok_or_else(|| StoreError::NotFound("global supply not initialized".to_string()))?;

        txn.commit().await?;

        Ok(AtomicClaimOutcome::Credited(ClaimCredit {
            event_id: event.id,
            claimed_amount: amount,
            new_balance: account.balance,
            global_claimed: supply.total_claimed,
            global_remaining: supply.remaining(),
            referred_by: account.referred_by,
        }))
    }

    async fn credit_balance(&self, id: Uuid, amount: Decimal) -> Result<Decimal, StoreError> {
        let txn = self.db.begin().await?;

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount),
            )
            .filter(accounts::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("account {}", id)));
        }

        let account = accounts::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;

        txn.commit().await?;
        Ok(account.balance)
    }

    async fn record_commission(&self, commission: NewCommission) -> Result<bool, StoreError> {
        let record = commission_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            referrer_id: Set(commission.referrer_id),
            referred_user_id: Set(commission.referred_user_id),
            source_event_id: Set(commission.source_event_id),
            amount: Set(commission.amount),
            commission_type: Set(commission.commission_type.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let inserted = commission_records::Entity::insert(record)
            .on_conflict(
                OnConflict::columns([
                    commission_records::Column::SourceEventId,
                    commission_records::Column::CommissionType,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }

    async fn commissions_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<CommissionRecord>, StoreError> {
        commission_records::Entity::find()
            .filter(commission_records::Column::ReferrerId.eq(referrer_id))
            .order_by_desc(commission_records::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_commission)
            .collect()
    }

    async fn count_accounts(&self) -> Result<u64, StoreError> {
        Ok(accounts::Entity::find().count(&self.db).await?)
    }

    async fn count_completed_trades(&self) -> Result<u64, StoreError> {
        Ok(p2p_trades::Entity::find()
            .filter(p2p_trades::Column::Status.eq(p2p_trades::STATUS_COMPLETED))
            .count(&self.db)
            .await?)
    }

    async fn count_trades_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(p2p_trades::Entity::find()
            .filter(p2p_trades::Column::CreatedAt.gte(since.fixed_offset()))
            .count(&self.db)
            .await?)
    }

    async fn latest_price(&self) -> Result<Option<PriceSample>, StoreError> {
        Ok(price_samples::Entity::find()
            .order_by_desc(price_samples::Column::ObservedAt)
            .one(&self.db)
            .await?
            .map(to_sample))
    }

    async fn price_at_or_before(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<PriceSample>, StoreError> {
        Ok(price_samples::Entity::find()
            .filter(price_samples::Column::ObservedAt.lte(at.fixed_offset()))
            .order_by_desc(price_samples::Column::ObservedAt)
            .one(&self.db)
            .await?
            .map(to_sample))
    }

    async fn recent_prices(&self, limit: u64) -> Result<Vec<PriceSample>, StoreError> {
        Ok(price_samples::Entity::find()
            .order_by_desc(price_samples::Column::ObservedAt)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_sample)
            .collect())
    }

    async fn append_price_sample(&self, sample: NewPriceSample) -> Result<PriceSample, StoreError> {
        let model = price_samples::ActiveModel {
            price: Set(sample.price),
            change_percent: Set(sample.change_percent),
            strategy: Set(sample.strategy),
            observed_at: Set(sample.observed_at.fixed_offset()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(to_sample(model))
    }

    async fn upsert_daily_price(
        &self,
        date: NaiveDate,
        closing_price: Decimal,
    ) -> Result<DailyPriceRecord, StoreError> {
        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;

        // First observation of the day fixes the opening price
        let inserted = daily_price_records::Entity::insert(daily_price_records::ActiveModel {
            date: Set(date),
            opening_price: Set(closing_price),
            closing_price: Set(closing_price),
            daily_change_percent: Set(Decimal::ZERO),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(daily_price_records::Column::Date)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let record = daily_price_records::Entity::find_by_id(date)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("daily price record {}", date)))?;

        let record = if inserted > 0 {
            record
        } else {
            let opening_price = record.opening_price;
            let mut active: daily_price_records::ActiveModel = record.into();
            active.closing_price = Set(closing_price);
            active.daily_change_percent = Set(daily_change_percent(opening_price, closing_price));
            active.updated_at = Set(now);
            active.update(&txn).await?
        };

        txn.commit().await?;
        Ok(to_daily(record))
    }

    async fn daily_prices(&self, limit: u64) -> Result<Vec<DailyPriceRecord>, StoreError> {
        Ok(daily_price_records::Entity::find()
            .order_by_desc(daily_price_records::Column::Date)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_daily)
            .collect())
    }
}
