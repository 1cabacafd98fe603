//! Price oracle domain types and the price endpoint payloads

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A persisted observation of the computed price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    pub price: Decimal,
    pub change_percent: Decimal,
    pub strategy: String,
    pub observed_at: DateTime<Utc>,
}

/// Summary of one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPriceRecord {
    pub date: NaiveDate,
    pub opening_price: Decimal,
    pub closing_price: Decimal,
    pub daily_change_percent: Decimal,
}

/// Result of a price evaluation, as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: f64,
    pub previous_price: f64,
    pub change_percent: f64,
    pub is_green: bool,
    pub observed_at: DateTime<Utc>,
    pub strategy: String,
}

impl PriceQuote {
    /// Neutral quote returned whenever evaluation fails
    pub fn fallback(strategy: &str, observed_at: DateTime<Utc>) -> Self {
        Self {
            price: 1.0,
            previous_price: 1.0,
            change_percent: 0.0,
            is_green: true,
            observed_at,
            strategy: strategy.to_string(),
        }
    }
}

/// Response entry for stored samples
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSampleEntry {
    pub price: f64,
    pub change_percent: f64,
    pub strategy: String,
    pub observed_at: DateTime<Utc>,
}

impl From<PriceSample> for PriceSampleEntry {
    fn from(sample: PriceSample) -> Self {
        Self {
            price: sample.price.to_f64().unwrap_or(0.0),
            change_percent: sample.change_percent.to_f64().unwrap_or(0.0),
            strategy: sample.strategy,
            observed_at: sample.observed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPriceEntry {
    pub date: String,
    pub opening_price: f64,
    pub closing_price: f64,
    pub daily_change_percent: f64,
}

impl From<DailyPriceRecord> for DailyPriceEntry {
    fn from(record: DailyPriceRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            opening_price: record.opening_price.to_f64().unwrap_or(0.0),
            closing_price: record.closing_price.to_f64().unwrap_or(0.0),
            daily_change_percent: record.daily_change_percent.to_f64().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceHistoryResponse {
    pub data: Vec<PriceSampleEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyPricesResponse {
    pub data: Vec<DailyPriceEntry>,
}

pub const DEFAULT_HISTORY_LIMIT: u64 = 100;
pub const MAX_HISTORY_LIMIT: u64 = 1000;
pub const DEFAULT_DAILY_DAYS: u64 = 30;
pub const MAX_DAILY_DAYS: u64 = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct PriceHistoryQuery {
    pub limit: Option<u64>,
}

impl PriceHistoryQuery {
    pub fn validate(&self) -> Result<u64, String> {
        bounded(self.limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT, "limit")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyPricesQuery {
    pub days: Option<u64>,
}

impl DailyPricesQuery {
    pub fn validate(&self) -> Result<u64, String> {
        bounded(self.days, DEFAULT_DAILY_DAYS, MAX_DAILY_DAYS, "days")
    }
}

fn bounded(value: Option<u64>, default: u64, max: u64, name: &str) -> Result<u64, String> {
    match value {
        None => Ok(default),
        Some(v) if v >= 1 && v <= max => Ok(v),
        Some(v) => Err(format!(
            "Invalid {}: {}. Must be between 1 and {}",
            name, v, max
        )),
    }
}
