//! Shared numeric and time helpers for the pricing strategies

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Fractional part, `x - floor(x)`; always in [0, 1) for finite input
pub fn frac(x: f64) -> f64 {
    x - x.floor()
}

/// Days elapsed since January 1st of `now`'s year (Jan 1 = 0)
pub fn day_of_year(now: DateTime<Utc>) -> u32 {
    now.ordinal0()
}

/// Seconds elapsed since midnight UTC
pub fn seconds_of_day(now: DateTime<Utc>) -> u32 {
    now.hour() * 3600 + now.minute() * 60 + now.second()
}

/// Most recent `hour:00` UTC at or before `now`
pub fn last_anchor(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(hour.min(23), 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now);

    if today <= now {
        today
    } else {
        today - Duration::days(1)
    }
}

/// `(new - previous) / previous * 100`, zero when there is no usable previous price
pub fn percent_change(previous: f64, new: f64) -> f64 {
    if previous <= 0.0 || !previous.is_finite() {
        return 0.0;
    }
    (new - previous) / previous * 100.0
}

/// Convert to Decimal with exactly 2 fraction digits; None for NaN or infinite input
pub fn round_price(price: f64) -> Option<Decimal> {
    Decimal::from_f64(price).map(|d| {
        let mut rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded
    })
}

/// Convert to Decimal rounded to `dp` places
pub fn to_decimal(value: f64, dp: u32) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(dp))
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
