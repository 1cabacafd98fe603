//! Referral commission listing

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::{ApiError, caller_id, not_authenticated, store_error};
use crate::AppState;
use crate::models::commission::CommissionListResponse;
use crate::models::error::ErrorResponse;

/// GET /api/referrals/{referrer_id}/commissions
///
/// Only the referrer may list their own commissions.
pub async fn get_commissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(referrer_id): Path<Uuid>,
) -> Result<Json<CommissionListResponse>, ApiError> {
    let caller = caller_id(&headers)?.ok_or_else(not_authenticated)?;

    if caller != referrer_id {
        warn!(caller = %caller, referrer_id = %referrer_id, "Commission listing for another account");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "UNAUTHORIZED",
                "Commissions can only be viewed by their referrer",
            )),
        ));
    }

    state
        .referrals
        .commissions_for(referrer_id)
        .await
        .map(Json)
        .map_err(store_error)
}
