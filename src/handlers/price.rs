//! Price endpoints
//!
//! GET /api/price/current evaluates; the other endpoints only read stored samples.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::{info, warn};

use super::{ApiError, store_error, validation_error};
use crate::AppState;
use crate::models::error::ErrorResponse;
use crate::models::price::{
    DailyPriceEntry, DailyPricesQuery, DailyPricesResponse, PriceHistoryQuery,
    PriceHistoryResponse, PriceQuote, PriceSampleEntry,
};

/// GET /api/price/current
///
/// Runs the configured strategy now. Always 200: on internal failure the
/// quote is the neutral fallback.
pub async fn get_current_price(State(state): State<AppState>) -> Json<PriceQuote> {
    Json(state.oracle.evaluate().await)
}

/// GET /api/price/latest
///
/// # Response
/// - 200: Latest stored sample
/// - 404: No sample recorded yet
pub async fn get_latest_price(
    State(state): State<AppState>,
) -> Result<Json<PriceSampleEntry>, ApiError> {
    match state.oracle.latest().await.map_err(store_error)? {
        Some(sample) => Ok(Json(sample.into())),
        None => {
            warn!("Latest price requested before any sample exists");
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NOT_FOUND", "No price data available")),
            ))
        }
    }
}

/// GET /api/price/history
///
/// # Query Parameters
/// - `limit`: 1..=1000 (default: 100), newest first
pub async fn get_price_history(
    State(state): State<AppState>,
    Query(query): Query<PriceHistoryQuery>,
) -> Result<Json<PriceHistoryResponse>, ApiError> {
    let limit = query.validate().map_err(validation_error)?;
    info!(limit = limit, "Fetching price history");

    let samples = state.oracle.history(limit).await.map_err(store_error)?;

    Ok(Json(PriceHistoryResponse {
        data: samples.into_iter().map(PriceSampleEntry::from).collect(),
    }))
}

/// GET /api/price/daily
///
/// # Query Parameters
/// - `days`: 1..=365 (default: 30), newest first
pub async fn get_daily_prices(
    State(state): State<AppState>,
    Query(query): Query<DailyPricesQuery>,
) -> Result<Json<DailyPricesResponse>, ApiError> {
    let days = query.validate().map_err(validation_error)?;
    info!(days = days, "Fetching daily price records");

    let records = state.oracle.daily(days).await.map_err(store_error)?;

    Ok(Json(DailyPricesResponse {
        data: records.into_iter().map(DailyPriceEntry::from).collect(),
    }))
}
