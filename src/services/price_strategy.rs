//! Pricing strategies
//!
//! Two independent formulas produce the simulated token price:
//!
//! - [`SupplyDemandStrategy`] (ZiroX): base price scaled by supply utilization,
//!   user/trade demand, a per-day trend and an intraday micro-fluctuation.
//! - [`DailyTargetStrategy`] (GX): a bounded walk from the previous price
//!   toward a +3% daily target, with volatility driven by recent trades.
//!
//! Strategies are pure: the oracle gathers a [`MarketSnapshot`] from storage
//! and hands it over together with the evaluation time.

use chrono::{DateTime, Duration, Utc};

use crate::config::StrategyKind;
use crate::services::price_utils::{day_of_year, frac, last_anchor, seconds_of_day};

pub const BASE_PRICE: f64 = 1.0;

const DAILY_SEED_MULTIPLIER: f64 = 12345.0;
const SIN_SCALE: f64 = 10000.0;

/// Maps a seed to a value in [0, 1)
pub trait RandomSource: Send + Sync {
    fn unit(&self, seed: f64) -> f64;
}

/// `frac(sin(seed) * 10000)`
///
/// Deterministic per seed and NOT uniformly distributed; kept bit-for-bit so
/// the price curve matches historical samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinHash;

impl RandomSource for SinHash {
    fn unit(&self, seed: f64) -> f64 {
        frac(seed.sin() * SIN_SCALE)
    }
}

/// Inputs read from storage before each evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub total_claimed: f64,
    pub max_supply: f64,
    pub total_users: u64,
    pub completed_trades: u64,
    /// Trades created during the last hour
    pub recent_trades: u64,
    pub previous_price: f64,
    /// Latest sample at or before the strategy's reference time, if it asked for one
    pub reference_price: Option<f64>,
}

impl Default for MarketSnapshot {
    fn default() -> Self {
        Self {
            total_claimed: 0.0,
            max_supply: 1.0,
            total_users: 1,
            completed_trades: 0,
            recent_trades: 0,
            previous_price: BASE_PRICE,
            reference_price: None,
        }
    }
}

pub trait PriceStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Time whose stored price the strategy wants as `reference_price`
    fn reference_time(&self, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        None
    }

    /// Unrounded new price
    fn compute(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> f64;
}

/// Individual ZiroX factors, exposed for logging and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyDemandFactors {
    pub supply_factor: f64,
    pub demand_factor: f64,
    pub daily_volatility: f64,
    pub micro_fluctuation: f64,
}

impl SupplyDemandFactors {
    pub fn price(&self) -> f64 {
        BASE_PRICE
            * self.supply_factor
            * self.demand_factor
            * self.daily_volatility
            * self.micro_fluctuation
    }
}

pub struct SupplyDemandStrategy {
    random: Box<dyn RandomSource>,
}

impl Default for SupplyDemandStrategy {
    fn default() -> Self {
        Self::new(Box::new(SinHash))
    }
}

impl SupplyDemandStrategy {
    pub fn new(random: Box<dyn RandomSource>) -> Self {
        Self { random }
    }

    pub fn factors(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> SupplyDemandFactors {
        let supply_utilization = if market.max_supply > 0.0 {
            market.total_claimed / market.max_supply
        } else {
            0.0
        };
        let supply_factor = 1.0 + supply_utilization * 1.5;

        let active_users_factor = (market.total_users as f64 / 100.0).min(1.5);
        let trade_activity_factor = (market.completed_trades as f64 / 50.0).min(0.5);
        let demand_factor = 1.0 + active_users_factor + trade_activity_factor;

        let daily_seed = day_of_year(now) as f64 * DAILY_SEED_MULTIPLIER;
        let random = self.random.unit(daily_seed);
        let daily_volatility = if random < 0.75 {
            1.0 + 0.01 + random * 0.09
        } else {
            1.0 - (random - 0.75) * 0.4
        };

        let micro_random = self.random.unit(seconds_of_day(now) as f64);
        let micro_fluctuation = 1.0 + (micro_random - 0.5) * 0.002;

        SupplyDemandFactors {
            supply_factor,
            demand_factor,
            daily_volatility,
            micro_fluctuation,
        }
    }
}

impl PriceStrategy for SupplyDemandStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Zirox
    }

    fn compute(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> f64 {
        self.factors(market, now).price()
    }
}

const GX_DAILY_TARGET: f64 = 1.03;
const GX_BASE_VOLATILITY: f64 = 0.02;
const GX_VOLATILITY_PER_TRADE: f64 = 0.01;
const GX_MAX_VOLATILITY: f64 = 0.2;
const GX_LOWER_BOUND: f64 = 0.8;
const GX_UPPER_BOUND: f64 = 1.2;

pub struct DailyTargetStrategy {
    anchor_hour: u32,
    random: Box<dyn RandomSource>,
}

impl DailyTargetStrategy {
    pub fn new(anchor_hour: u32, random: Box<dyn RandomSource>) -> Self {
        Self {
            anchor_hour,
            random,
        }
    }

    pub fn volatility(recent_trades: u64) -> f64 {
        (GX_BASE_VOLATILITY + recent_trades as f64 * GX_VOLATILITY_PER_TRADE)
            .min(GX_MAX_VOLATILITY)
    }

    /// Share of the current anchor-to-anchor window already elapsed, in [0, 1]
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let start = last_anchor(now, self.anchor_hour);
        let elapsed = now.signed_duration_since(start).num_milliseconds() as f64;
        let window = Duration::days(1).num_milliseconds() as f64;
        (elapsed / window).clamp(0.0, 1.0)
    }
}

impl PriceStrategy for DailyTargetStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Gx
    }

    fn reference_time(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Some(last_anchor(now, self.anchor_hour))
    }

    fn compute(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> f64 {
        let previous = market.previous_price;
        let reference = market.reference_price.unwrap_or(previous);
        let target = reference * GX_DAILY_TARGET;
        let progress = self.progress(now);

        let path = reference + (target - reference) * progress;
        let drift = previous + (path - previous) * progress;

        let volatility = Self::volatility(market.recent_trades);
        let r = self.random.unit(now.timestamp() as f64);
        let shocked = drift * (1.0 + (r - 0.5) * 2.0 * volatility);

        shocked.clamp(reference * GX_LOWER_BOUND, reference * GX_UPPER_BOUND)
    }
}

/// Build the configured strategy with the default random source
pub fn strategy_for(kind: StrategyKind, gx_anchor_hour: u32) -> Box<dyn PriceStrategy> {
    match kind {
        StrategyKind::Zirox => Box::new(SupplyDemandStrategy::default()),
        StrategyKind::Gx => Box::new(DailyTargetStrategy::new(gx_anchor_hour, Box::new(SinHash))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Returns the same value for every seed
    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn unit(&self, _seed: f64) -> f64 {
            self.0
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_sin_hash_matches_formula() {
        let hash = SinHash;
        assert_eq!(hash.unit(0.0), 0.0);
        let seed: f64 = 288.0 * 12345.0;
        let expected = seed.sin() * 10000.0;
        assert_eq!(hash.unit(seed), expected - expected.floor());
        for seed in [1.0, 12345.0, 86399.0, 4_500_000.0] {
            let v = hash.unit(seed);
            assert!((0.0..1.0).contains(&v), "seed {} gave {}", seed, v);
        }
    }

    #[test]
    fn test_supply_demand_price() {
        let strategy = SupplyDemandStrategy::new(Box::new(Fixed(0.5)));
        let market = MarketSnapshot {
            total_claimed: 100_000.0,
            max_supply: 200_000.0,
            total_users: 50,
            completed_trades: 10,
            ..Default::default()
        };

        let factors = strategy.factors(&market, noon());
        assert!((factors.supply_factor - 1.75).abs() < 1e-12);
        assert!((factors.demand_factor - 1.7).abs() < 1e-12);
        assert!((factors.daily_volatility - 1.055).abs() < 1e-12);
        assert!((factors.micro_fluctuation - 1.0).abs() < 1e-12);
        assert!((strategy.compute(&market, noon()) - 3.138625).abs() < 1e-9);
    }

    #[test]
    fn test_demand_factors_are_capped() {
        let strategy = SupplyDemandStrategy::new(Box::new(Fixed(0.5)));
        let market = MarketSnapshot {
            total_users: 10_000,
            completed_trades: 10_000,
            ..Default::default()
        };
        let factors = strategy.factors(&market, noon());
        assert!((factors.demand_factor - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_daily_volatility_branches() {
        let market = MarketSnapshot::default();

        let up = SupplyDemandStrategy::new(Box::new(Fixed(0.74))).factors(&market, noon());
        assert!((up.daily_volatility - (1.01 + 0.74 * 0.09)).abs() < 1e-12);
        assert!(up.daily_volatility > 1.0);

        let down = SupplyDemandStrategy::new(Box::new(Fixed(0.9))).factors(&market, noon());
        assert!((down.daily_volatility - (1.0 - 0.15 * 0.4)).abs() < 1e-12);
        assert!(down.daily_volatility < 1.0);
    }

    #[test]
    fn test_micro_fluctuation_stays_within_a_tenth_of_a_percent() {
        let market = MarketSnapshot::default();
        for r in [0.0, 0.25, 0.999] {
            let f = SupplyDemandStrategy::new(Box::new(Fixed(r))).factors(&market, noon());
            assert!((f.micro_fluctuation - 1.0).abs() <= 0.001 + 1e-12);
        }
    }

    #[test]
    fn test_same_day_same_trend() {
        let strategy = SupplyDemandStrategy::default();
        let market = MarketSnapshot::default();
        let morning = Utc.with_ymd_and_hms(2026, 10, 16, 1, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 10, 16, 23, 0, 0).unwrap();
        assert_eq!(
            strategy.factors(&market, morning).daily_volatility,
            strategy.factors(&market, evening).daily_volatility
        );
    }

    #[test]
    fn test_gx_volatility_cap() {
        assert!((DailyTargetStrategy::volatility(0) - 0.02).abs() < 1e-12);
        assert!((DailyTargetStrategy::volatility(5) - 0.07).abs() < 1e-12);
        assert!((DailyTargetStrategy::volatility(500) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_gx_without_noise_walks_toward_target() {
        let strategy = DailyTargetStrategy::new(15, Box::new(Fixed(0.5)));
        let market = MarketSnapshot {
            previous_price: 2.0,
            reference_price: Some(2.0),
            ..Default::default()
        };

        // 21:00 is a quarter of the way through the 15:00 -> 15:00 window
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 21, 0, 0).unwrap();
        assert!((strategy.progress(now) - 0.25).abs() < 1e-12);

        let path = 2.0 + (2.06 - 2.0) * 0.25;
        let expected = 2.0 + (path - 2.0) * 0.25;
        assert!((strategy.compute(&market, now) - expected).abs() < 1e-12);
        assert_eq!(
            strategy.reference_time(now),
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_gx_is_clamped_to_reference_band() {
        let market = MarketSnapshot {
            previous_price: 5.0,
            reference_price: Some(2.0),
            recent_trades: 100,
            ..Default::default()
        };
        let now = noon();

        let high = DailyTargetStrategy::new(15, Box::new(Fixed(0.99))).compute(&market, now);
        assert!((high - 2.4).abs() < 1e-12);

        let low_market = MarketSnapshot {
            previous_price: 0.5,
            ..market
        };
        let low = DailyTargetStrategy::new(15, Box::new(Fixed(0.01))).compute(&low_market, now);
        assert!((low - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_strategy_for_kind() {
        assert_eq!(strategy_for(StrategyKind::Zirox, 15).kind(), StrategyKind::Zirox);
        let gx = strategy_for(StrategyKind::Gx, 15);
        assert_eq!(gx.kind(), StrategyKind::Gx);
        assert!(gx.reference_time(noon()).is_some());
    }
}
