//! Account endpoints

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};

use super::{ApiError, account_error, caller_id, not_authenticated};
use crate::AppState;
use crate::models::claim::{AccountResponse, RegisterAccountRequest};

/// POST /api/accounts
///
/// Registers the caller. `referredBy` must name an existing account other
/// than the caller and can only be set here.
///
/// # Response
/// - 201: Account created
/// - 400: Self-referral or already registered
/// - 401: No caller identity
/// - 404: Referrer not found
pub async fn register_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let id = caller_id(&headers)?.ok_or_else(not_authenticated)?;

    let account = state
        .accounts
        .register(id, request.referred_by)
        .await
        .map_err(account_error)?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /api/accounts/me
pub async fn get_own_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountResponse>, ApiError> {
    let id = caller_id(&headers)?.ok_or_else(not_authenticated)?;
    let account = state.accounts.account(id).await.map_err(account_error)?;
    Ok(Json(account.into()))
}
