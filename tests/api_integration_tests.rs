mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use zirox_backend::config::{AppConfig, ClaimConfig};
use zirox_backend::store::{NewPriceSample, PlatformStore};

use crate::common::{memory_app, send};

async fn register(app: &axum::Router, referred_by: Option<Uuid>) -> Uuid {
    let id = Uuid::new_v4();
    let (status, _) = send(
        app,
        "POST",
        "/api/accounts",
        Some(id),
        Some(json!({ "referredBy": referred_by })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id
}

#[tokio::test]
async fn test_health() {
    let (_store, app) = memory_app(AppConfig::default()).await;
    let (status, _) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_current_price_is_persisted() {
    let (_store, app) = memory_app(AppConfig::default()).await;

    let (status, latest) = send(&app, "GET", "/api/price/latest", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(latest["code"], "NOT_FOUND");

    let (status, quote) = send(&app, "GET", "/api/price/current", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["strategy"], "zirox");
    assert_eq!(quote["previousPrice"], 1.0);
    let price = quote["price"].as_f64().unwrap();
    assert_eq!((price * 100.0).round() / 100.0, price);

    let (status, latest) = send(&app, "GET", "/api/price/latest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["price"].as_f64().unwrap(), price);

    let (status, history) = send(&app, "GET", "/api/price/history?limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["data"].as_array().unwrap().len(), 1);

    let (status, daily) = send(&app, "GET", "/api/price/daily", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let days = daily["data"].as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["openingPrice"].as_f64().unwrap(), price);
    assert_eq!(days[0]["date"], Utc::now().date_naive().format("%Y-%m-%d").to_string());
}

#[tokio::test]
async fn test_price_query_validation() {
    let (_store, app) = memory_app(AppConfig::default()).await;

    let (status, body) = send(&app, "GET", "/api/price/history?limit=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/price/daily?days=366", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gx_strategy_selection() {
    let mut config = AppConfig::default();
    config.price.strategy = zirox_backend::config::StrategyKind::Gx;
    let (_store, app) = memory_app(config).await;

    let (status, quote) = send(&app, "GET", "/api/price/current", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["strategy"], "gx");
    let price = quote["price"].as_f64().unwrap();
    assert!((0.8..=1.2).contains(&price), "gx price {} outside band", price);
}

#[tokio::test]
async fn test_claim_flow() {
    let (_store, app) = memory_app(AppConfig::default()).await;
    let id = register(&app, None).await;

    let (status, eligibility) = send(&app, "GET", "/api/claim/eligibility", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(eligibility["canClaim"], true);
    assert_eq!(eligibility["remainingCooldownMs"], 0);

    let (status, receipt) = send(&app, "POST", "/api/claim", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["success"], true);
    assert_eq!(receipt["claimedAmount"], "3");
    assert_eq!(receipt["newBalance"], "3");
    assert_eq!(receipt["globalClaimed"], "3");

    let (status, eligibility) = send(&app, "GET", "/api/claim/eligibility", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(eligibility["canClaim"], false);
    assert!(eligibility["remainingCooldownMs"].as_i64().unwrap() > 10_700_000);

    let (status, body) = send(&app, "POST", "/api/claim", Some(id), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "COOLDOWN_ACTIVE");
    assert!(body["remainingMs"].as_i64().unwrap() > 0);

    let (status, supply) = send(&app, "GET", "/api/supply", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(supply["totalClaimed"], "3");
    assert_eq!(supply["remaining"], "199997");

    let (status, account) = send(&app, "GET", "/api/accounts/me", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["balance"], "3");
}

#[tokio::test]
async fn test_claim_errors() {
    let (store, app) = memory_app(AppConfig::default()).await;

    let (status, body) = send(&app, "POST", "/api/claim", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NOT_AUTHENTICATED");

    let (status, body) = send(&app, "POST", "/api/claim", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROFILE_NOT_FOUND");

    let id = register(&app, None).await;
    store.set_total_claimed(dec!(199998));
    let (status, body) = send(&app, "POST", "/api/claim", Some(id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "GLOBAL_SUPPLY_EXHAUSTED");
    assert_eq!(body["globalLimitReached"], true);

    let (status, eligibility) = send(&app, "GET", "/api/claim/eligibility", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(eligibility["globalLimitReached"], true);
}

#[tokio::test]
async fn test_eligibility_never_errors() {
    let (store, app) = memory_app(AppConfig::default()).await;

    let (status, body) = send(&app, "GET", "/api/claim/eligibility", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canClaim"], false);

    store.set_unavailable(true);
    let (status, body) = send(&app, "GET", "/api/claim/eligibility", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canClaim"], false);

    let (status, body) = send(&app, "GET", "/api/supply", None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "EXTERNAL_OPERATION_FAILED");
}

#[tokio::test]
async fn test_claim_timeout_surfaces_as_atomic_failure() {
    let config = AppConfig {
        claim: ClaimConfig {
            external_timeout: std::time::Duration::from_millis(20),
            ..ClaimConfig::default()
        },
        ..AppConfig::default()
    };
    let (store, app) = memory_app(config).await;
    let id = register(&app, None).await;
    store.set_claim_delay(Some(std::time::Duration::from_millis(300)));

    let (status, body) = send(&app, "POST", "/api/claim", Some(id), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "ATOMIC_CLAIM_FAILED");
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_hung_store_yields_neutral_price() {
    let config = AppConfig {
        claim: ClaimConfig {
            external_timeout: std::time::Duration::from_millis(20),
            ..ClaimConfig::default()
        },
        ..AppConfig::default()
    };
    let (store, app) = memory_app(config).await;
    store.set_supply_delay(Some(std::time::Duration::from_secs(3600)));

    let (status, quote) = send(&app, "GET", "/api/price/current", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["price"], 1.0);
    assert_eq!(quote["changePercent"], 0.0);
}

#[tokio::test]
async fn test_registration_rules() {
    let (_store, app) = memory_app(AppConfig::default()).await;

    let (status, body) = send(&app, "POST", "/api/accounts", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NOT_AUTHENTICATED");

    let id = Uuid::new_v4();
    let (status, body) = send(
        &app,
        "POST",
        "/api/accounts",
        Some(id),
        Some(json!({ "referredBy": id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        "POST",
        "/api/accounts",
        Some(id),
        Some(json!({ "referredBy": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let referrer = register(&app, None).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/accounts",
        Some(referrer),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_referral_commission_flow() {
    let (store, app) = memory_app(AppConfig::default()).await;
    let referrer = register(&app, None).await;
    let referee = register(&app, Some(referrer)).await;

    store
        .append_price_sample(NewPriceSample {
            price: dec!(1.50),
            change_percent: dec!(0),
            strategy: "zirox".to_string(),
            observed_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();

    let (status, receipt) = send(&app, "POST", "/api/claim", Some(referee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["referralCommission"], "0.225");

    let uri = format!("/api/referrals/{}/commissions", referrer);
    let (status, list) = send(&app, "GET", &uri, Some(referrer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["totalAmount"], "0.225");
    let records = list["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["type"], "claim_commission");
    assert_eq!(records[0]["referredUserId"], referee.to_string());

    let (status, body) = send(&app, "GET", &uri, Some(referee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, account) = send(&app, "GET", "/api/accounts/me", Some(referrer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["balance"], "0.3");
}
