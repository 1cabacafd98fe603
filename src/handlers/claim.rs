//! Claim endpoints

use axum::{Json, extract::State, http::HeaderMap};
use tracing::info;

use super::{ApiError, caller_id, claim_error, store_error};
use crate::AppState;
use crate::models::claim::{ClaimReceipt, Eligibility, SupplyResponse};
use crate::store::with_timeout;

/// GET /api/claim/eligibility
///
/// Never fails: unknown or malformed callers simply cannot claim.
pub async fn get_eligibility(State(state): State<AppState>, headers: HeaderMap) -> Json<Eligibility> {
    let account = caller_id(&headers).ok().flatten();
    Json(state.claim_gate.check_eligibility(account).await)
}

/// POST /api/claim
///
/// # Response
/// - 200: Claim credited
/// - 401: No caller identity
/// - 404: Caller has no account
/// - 409: Supply exhausted (`globalLimitReached: true`)
/// - 429: Cooldown active (`remainingMs`)
/// - 502: Atomic claim failed or timed out
pub async fn post_claim(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClaimReceipt>, ApiError> {
    let account = caller_id(&headers)?;
    info!(account_id = ?account, "Claim requested");

    state
        .claim_gate
        .perform_claim(account)
        .await
        .map(Json)
        .map_err(claim_error)
}

/// GET /api/supply
pub async fn get_supply(State(state): State<AppState>) -> Result<Json<SupplyResponse>, ApiError> {
    let timeout = state.claim_gate.config().external_timeout;
    let supply = with_timeout(timeout, state.store.global_supply())
        .await
        .map_err(store_error)?;
    Ok(Json(supply.into()))
}
