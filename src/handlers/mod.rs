//! HTTP handlers and the error mapping they share
//!
//! Every failure is returned as `(StatusCode, Json<ErrorResponse>)` so the
//! body always has the `{ success: false, error, code }` shape.

use axum::{Json, http::HeaderMap, http::StatusCode};
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::error::ErrorResponse;
use crate::services::accounts::AccountError;
use crate::services::claim_gate::ClaimError;
use crate::store::StoreError;

pub mod account;
pub mod claim;
pub mod price;
pub mod referral;

/// Header set by the upstream auth proxy
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Caller identity from [`ACCOUNT_ID_HEADER`]
///
/// Missing header is `Ok(None)`; a value that is not a uuid is rejected.
pub fn caller_id(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(raw) = headers.get(ACCOUNT_ID_HEADER) else {
        return Ok(None);
    };

    raw.to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .map(Some)
        .ok_or_else(|| {
            warn!("Malformed account id header");
            validation_error("Invalid account id header")
        })
}

pub fn validation_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("VALIDATION_ERROR", message)),
    )
}

pub fn not_authenticated() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("NOT_AUTHENTICATED", "Not authenticated")),
    )
}

/// Store failures never expose the underlying database message
pub fn store_error(e: StoreError) -> ApiError {
    error!(error = %e, "Store operation failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse::new(
            "EXTERNAL_OPERATION_FAILED",
            "Storage operation failed",
        )),
    )
}

pub fn claim_error(e: ClaimError) -> ApiError {
    let status = match &e {
        ClaimError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ClaimError::ProfileNotFound => StatusCode::NOT_FOUND,
        ClaimError::GlobalSupplyExhausted => StatusCode::CONFLICT,
        ClaimError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
        ClaimError::AtomicClaimFailed(_) => StatusCode::BAD_GATEWAY,
    };

    let mut body = ErrorResponse::new(e.code(), e.to_string());
    match &e {
        ClaimError::CooldownActive { remaining_ms } => body.remaining_ms = Some(*remaining_ms),
        ClaimError::GlobalSupplyExhausted => body.global_limit_reached = Some(true),
        _ => {}
    }

    (status, Json(body))
}

pub fn account_error(e: AccountError) -> ApiError {
    let status = match &e {
        AccountError::Validation(_) | AccountError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
        AccountError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountError::Store(inner) => {
            error!(error = %inner, "Account store operation failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(e.code(), "Storage operation failed")),
            );
        }
    };

    (status, Json(ErrorResponse::new(e.code(), e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_id(&headers).unwrap(), None);

        let id = Uuid::new_v4();
        headers.insert(ACCOUNT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(caller_id(&headers).unwrap(), Some(id));

        headers.insert(ACCOUNT_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let (status, body) = caller_id(&headers).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_claim_error_mapping() {
        let (status, body) = claim_error(ClaimError::CooldownActive { remaining_ms: 42 });
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.remaining_ms, Some(42));
        assert!(!body.success);

        let (status, body) = claim_error(ClaimError::GlobalSupplyExhausted);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.global_limit_reached, Some(true));

        let (status, body) = claim_error(ClaimError::AtomicClaimFailed("timed out".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "ATOMIC_CLAIM_FAILED");
        assert!(body.error.contains("timed out"));
    }

    #[test]
    fn test_store_error_hides_details() {
        let (status, body) = store_error(StoreError::Database("relation does not exist".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.error.contains("relation"));
    }
}
