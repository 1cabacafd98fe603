//! Price Oracle
//!
//! Gathers market inputs from the store, runs the configured
//! [`PriceStrategy`], appends the sample and rolls the daily record.
//! Evaluation never fails from the caller's point of view: any error is
//! logged and a neutral quote is returned instead.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::price::{DailyPriceRecord, PriceQuote, PriceSample};
use crate::services::price_strategy::{BASE_PRICE, MarketSnapshot, PriceStrategy};
use crate::services::price_utils::{percent_change, round_price, to_decimal, to_f64};
use crate::store::{NewPriceSample, PlatformStore, StoreError, with_timeout};

#[derive(Debug)]
pub enum OracleError {
    Store(StoreError),
    InvalidPrice(f64),
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Store(e) => write!(f, "{}", e),
            OracleError::InvalidPrice(p) => write!(f, "Strategy produced invalid price: {}", p),
        }
    }
}

impl std::error::Error for OracleError {}

impl From<StoreError> for OracleError {
    fn from(err: StoreError) -> Self {
        OracleError::Store(err)
    }
}

pub struct PriceOracle {
    store: Arc<dyn PlatformStore>,
    strategy: Box<dyn PriceStrategy>,
    /// Bound on every store call
    timeout: std::time::Duration,
    /// Held for the duration of one evaluation
    in_flight: Mutex<()>,
    /// Bumped after every finished evaluation
    generation: AtomicU64,
    last_quote: RwLock<Option<PriceQuote>>,
}

impl PriceOracle {
    pub fn new(
        store: Arc<dyn PlatformStore>,
        strategy: Box<dyn PriceStrategy>,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            store,
            strategy,
            timeout,
            in_flight: Mutex::new(()),
            generation: AtomicU64::new(0),
            last_quote: RwLock::new(None),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.kind().as_str()
    }

    /// Evaluate the price now
    pub async fn evaluate(&self) -> PriceQuote {
        self.evaluate_at(Utc::now()).await
    }

    /// Evaluate the price as of `now`.
    ///
    /// Only one evaluation runs at a time. Callers that queued behind a
    /// running evaluation receive its quote rather than starting another.
    pub async fn evaluate_at(&self, now: DateTime<Utc>) -> PriceQuote {
        let seen = self.generation.load(Ordering::SeqCst);
        let _guard = self.in_flight.lock().await;

        if self.generation.load(Ordering::SeqCst) != seen {
            let cached = self.last_quote.read().clone();
            if let Some(quote) = cached {
                debug!(price = quote.price, "Sharing result of concurrent price evaluation");
                return quote;
            }
        }

        let quote = match self.try_evaluate(now).await {
            Ok(quote) => quote,
            Err(e) => {
                error!(error = %e, strategy = self.strategy_name(), "Price evaluation failed, returning neutral price");
                PriceQuote::fallback(self.strategy_name(), now)
            }
        };

        *self.last_quote.write() = Some(quote.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);
        quote
    }

    async fn try_evaluate(&self, now: DateTime<Utc>) -> Result<PriceQuote, OracleError> {
        let market = self.gather_market(now).await?;
        let raw_price = self.strategy.compute(&market, now);

        let price = round_price(raw_price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or(OracleError::InvalidPrice(raw_price))?;
        let change = percent_change(market.previous_price, raw_price);

        with_timeout(
            self.timeout,
            self.store.append_price_sample(NewPriceSample {
                price,
                change_percent: to_decimal(change, 6).unwrap_or(Decimal::ZERO),
                strategy: self.strategy_name().to_string(),
                observed_at: now,
            }),
        )
        .await?;

        let daily = with_timeout(
            self.timeout,
            self.store.upsert_daily_price(now.date_naive(), price),
        )
        .await?;

        info!(
            strategy = self.strategy_name(),
            price = %price,
            previous_price = market.previous_price,
            change_percent = change,
            total_users = market.total_users,
            completed_trades = market.completed_trades,
            daily_open = %daily.opening_price,
            "Price evaluated"
        );

        Ok(PriceQuote {
            price: to_f64(price),
            previous_price: market.previous_price,
            change_percent: change,
            is_green: change >= 0.0,
            observed_at: now,
            strategy: self.strategy_name().to_string(),
        })
    }

    async fn gather_market(&self, now: DateTime<Utc>) -> Result<MarketSnapshot, StoreError> {
        let supply = with_timeout(self.timeout, self.store.global_supply()).await?;

        let total_users = match with_timeout(self.timeout, self.store.count_accounts()).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count accounts, assuming 1");
                1
            }
        };

        let completed_trades =
            with_timeout(self.timeout, self.store.count_completed_trades()).await?;
        let recent_trades = with_timeout(
            self.timeout,
            self.store.count_trades_since(now - Duration::hours(1)),
        )
        .await?;

        let previous_price = with_timeout(self.timeout, self.store.latest_price())
            .await?
            .map(|sample| to_f64(sample.price))
            .filter(|p| *p > 0.0)
            .unwrap_or(BASE_PRICE);

        let reference_price = match self.strategy.reference_time(now) {
            Some(at) => with_timeout(self.timeout, self.store.price_at_or_before(at))
                .await?
                .map(|sample| to_f64(sample.price))
                .filter(|p| *p > 0.0),
            None => None,
        };

        Ok(MarketSnapshot {
            total_claimed: to_f64(supply.total_claimed),
            max_supply: to_f64(supply.max_supply),
            total_users,
            completed_trades,
            recent_trades,
            previous_price,
            reference_price,
        })
    }

    /// Latest stored sample, without evaluating
    pub async fn latest(&self) -> Result<Option<PriceSample>, StoreError> {
        with_timeout(self.timeout, self.store.latest_price()).await
    }

    pub async fn history(&self, limit: u64) -> Result<Vec<PriceSample>, StoreError> {
        with_timeout(self.timeout, self.store.recent_prices(limit)).await
    }

    pub async fn daily(&self, days: u64) -> Result<Vec<DailyPriceRecord>, StoreError> {
        with_timeout(self.timeout, self.store.daily_prices(days)).await
    }
}
