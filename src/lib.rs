// src/lib.rs

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::AppConfig;
use services::{
    accounts::AccountService, claim_gate::ClaimGate, price_oracle::PriceOracle,
    price_strategy::strategy_for, referral::ReferralService,
};
use store::PlatformStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlatformStore>,
    pub oracle: Arc<PriceOracle>,
    pub claim_gate: Arc<ClaimGate>,
    pub accounts: Arc<AccountService>,
    pub referrals: Arc<ReferralService>,
}

impl AppState {
    /// Wire every service onto one store
    pub fn new(store: Arc<dyn PlatformStore>, config: &AppConfig) -> Self {
        let strategy = strategy_for(config.price.strategy, config.price.gx_anchor_hour_utc);
        let oracle = Arc::new(PriceOracle::new(
            store.clone(),
            strategy,
            config.claim.external_timeout,
        ));
        let referrals = Arc::new(ReferralService::new(store.clone(), &config.claim));
        let claim_gate = Arc::new(ClaimGate::new(
            store.clone(),
            referrals.clone(),
            config.claim.clone(),
        ));
        let accounts = Arc::new(AccountService::new(
            store.clone(),
            config.claim.external_timeout,
        ));

        Self {
            store,
            oracle,
            claim_gate,
            accounts,
            referrals,
        }
    }
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod accounts;
    pub mod claim_events;
    pub mod commission_records;
    pub mod daily_price_records;
    pub mod global_supply;
    pub mod p2p_trades;
    pub mod price_samples;
}

pub mod services {
    pub mod price_utils;
    pub mod price_strategy;
    pub mod price_oracle;
    pub mod referral;
    pub mod accounts;
    pub mod claim_gate;
}

pub mod store;
pub mod models;
pub mod handlers;
pub mod jobs;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello_zirox))
        .route("/api/price/current", get(handlers::price::get_current_price))
        .route("/api/price/latest", get(handlers::price::get_latest_price))
        .route("/api/price/history", get(handlers::price::get_price_history))
        .route("/api/price/daily", get(handlers::price::get_daily_prices))
        .route("/api/accounts", post(handlers::account::register_account))
        .route("/api/accounts/me", get(handlers::account::get_own_account))
        .route("/api/claim/eligibility", get(handlers::claim::get_eligibility))
        .route("/api/claim", post(handlers::claim::post_claim))
        .route("/api/supply", get(handlers::claim::get_supply))
        .route(
            "/api/referrals/{referrer_id}/commissions",
            get(handlers::referral::get_commissions),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello_zirox() -> &'static str {
    "ZiroX backend is running"
}
