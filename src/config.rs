//! Environment-driven service configuration
//!
//! Every key has a default except `DATABASE_URL`; without it the service runs
//! against the in-process store.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_CLAIM_AMOUNT: &str = "CLAIM_AMOUNT";
const ENV_CLAIM_COOLDOWN_SECS: &str = "CLAIM_COOLDOWN_SECS";
const ENV_MAX_SUPPLY: &str = "MAX_SUPPLY";
const ENV_COMMISSION_RATE: &str = "COMMISSION_RATE";
const ENV_REFERRER_BONUS: &str = "REFERRER_BONUS";
const ENV_PRICE_STRATEGY: &str = "PRICE_STRATEGY";
const ENV_GX_ANCHOR_HOUR_UTC: &str = "GX_ANCHOR_HOUR_UTC";
const ENV_EXTERNAL_OP_TIMEOUT_SECS: &str = "EXTERNAL_OP_TIMEOUT_SECS";
const ENV_PRICE_REFRESH_INTERVAL_SECS: &str = "PRICE_REFRESH_INTERVAL_SECS";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_CLAIM_AMOUNT: Decimal = dec!(3);
pub const DEFAULT_CLAIM_COOLDOWN_SECS: u64 = 10_800; // 3 hours
pub const DEFAULT_MAX_SUPPLY: Decimal = dec!(200000);
pub const DEFAULT_COMMISSION_RATE: Decimal = dec!(0.05);
pub const DEFAULT_REFERRER_BONUS: Decimal = dec!(0.3);
pub const DEFAULT_GX_ANCHOR_HOUR_UTC: u32 = 15;
pub const DEFAULT_EXTERNAL_OP_TIMEOUT_SECS: u64 = 10;

/// Which pricing formula the oracle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Supply/demand composition with daily and intraday factors
    Zirox,
    /// Bounded walk toward a daily target
    Gx,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Zirox => "zirox",
            StrategyKind::Gx => "gx",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zirox" => Ok(StrategyKind::Zirox),
            "gx" => Ok(StrategyKind::Gx),
            _ => Err(format!("Unknown price strategy: {}", s)),
        }
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Claim gate settings
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    pub claim_amount: Decimal,
    pub cooldown: Duration,
    pub max_supply: Decimal,
    pub commission_rate: Decimal,
    pub referrer_bonus: Decimal,
    /// Upper bound on each store call made while claiming
    pub external_timeout: Duration,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            claim_amount: DEFAULT_CLAIM_AMOUNT,
            cooldown: Duration::from_secs(DEFAULT_CLAIM_COOLDOWN_SECS),
            max_supply: DEFAULT_MAX_SUPPLY,
            commission_rate: DEFAULT_COMMISSION_RATE,
            referrer_bonus: DEFAULT_REFERRER_BONUS,
            external_timeout: Duration::from_secs(DEFAULT_EXTERNAL_OP_TIMEOUT_SECS),
        }
    }
}

/// Price oracle settings
#[derive(Debug, Clone)]
pub struct PriceConfig {
    pub strategy: StrategyKind,
    pub gx_anchor_hour_utc: u32,
    /// `None` disables the background refresh job
    pub refresh_interval: Option<Duration>,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Zirox,
            gx_anchor_hour_utc: DEFAULT_GX_ANCHOR_HOUR_UTC,
            refresh_interval: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub claim: ClaimConfig,
    pub price: PriceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            claim: ClaimConfig::default(),
            price: PriceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let claim_amount: Decimal =
            parse_or(&lookup, ENV_CLAIM_AMOUNT, DEFAULT_CLAIM_AMOUNT)?;
        if claim_amount <= Decimal::ZERO {
            return Err(ConfigError {
                key: ENV_CLAIM_AMOUNT,
                message: "must be positive".to_string(),
            });
        }

        let max_supply: Decimal = parse_or(&lookup, ENV_MAX_SUPPLY, DEFAULT_MAX_SUPPLY)?;
        if max_supply <= Decimal::ZERO {
            return Err(ConfigError {
                key: ENV_MAX_SUPPLY,
                message: "must be positive".to_string(),
            });
        }

        let commission_rate: Decimal =
            parse_or(&lookup, ENV_COMMISSION_RATE, DEFAULT_COMMISSION_RATE)?;
        if commission_rate < Decimal::ZERO {
            return Err(ConfigError {
                key: ENV_COMMISSION_RATE,
                message: "must not be negative".to_string(),
            });
        }

        let referrer_bonus: Decimal =
            parse_or(&lookup, ENV_REFERRER_BONUS, DEFAULT_REFERRER_BONUS)?;
        if referrer_bonus < Decimal::ZERO {
            return Err(ConfigError {
                key: ENV_REFERRER_BONUS,
                message: "must not be negative".to_string(),
            });
        }

        let cooldown_secs: u64 =
            parse_or(&lookup, ENV_CLAIM_COOLDOWN_SECS, DEFAULT_CLAIM_COOLDOWN_SECS)?;
        let timeout_secs: u64 = parse_or(
            &lookup,
            ENV_EXTERNAL_OP_TIMEOUT_SECS,
            DEFAULT_EXTERNAL_OP_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError {
                key: ENV_EXTERNAL_OP_TIMEOUT_SECS,
                message: "must be at least 1 second".to_string(),
            });
        }

        let strategy = match lookup(ENV_PRICE_STRATEGY) {
            Some(raw) => raw.parse::<StrategyKind>().map_err(|message| ConfigError {
                key: ENV_PRICE_STRATEGY,
                message,
            })?,
            None => StrategyKind::Zirox,
        };

        let gx_anchor_hour_utc: u32 =
            parse_or(&lookup, ENV_GX_ANCHOR_HOUR_UTC, DEFAULT_GX_ANCHOR_HOUR_UTC)?;
        if gx_anchor_hour_utc > 23 {
            return Err(ConfigError {
                key: ENV_GX_ANCHOR_HOUR_UTC,
                message: "must be between 0 and 23".to_string(),
            });
        }

        let refresh_secs: u64 = parse_or(&lookup, ENV_PRICE_REFRESH_INTERVAL_SECS, 0)?;

        Ok(Self {
            database_url: lookup(ENV_DATABASE_URL).filter(|url| !url.trim().is_empty()),
            bind_addr: lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            claim: ClaimConfig {
                claim_amount,
                cooldown: Duration::from_secs(cooldown_secs),
                max_supply,
                commission_rate,
                referrer_bonus,
                external_timeout: Duration::from_secs(timeout_secs),
            },
            price: PriceConfig {
                strategy,
                gx_anchor_hour_utc,
                refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError {
            key,
            message: format!("'{}' ({})", raw, e),
        }),
        None => Ok(default),
    }
}
