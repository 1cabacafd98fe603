//! Price Refresh Job
//!
//! Evaluates the price on a fixed interval so samples keep accruing without
//! client polling. Stops on SIGINT.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::services::price_oracle::PriceOracle;

/// Spawn the refresh loop
///
/// The first tick fires immediately. Ticks missed while an evaluation is
/// running are skipped rather than replayed.
pub fn start_price_refresh_job(oracle: Arc<PriceOracle>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = every.as_secs(),
            strategy = oracle.strategy_name(),
            "Price refresh job started"
        );

        let mut interval = interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping price refresh job");
                    break;
                }
                _ = interval.tick() => {
                    // Failures are logged by the oracle and yield a neutral quote
                    let quote = oracle.evaluate().await;
                    debug!(price = quote.price, change_percent = quote.change_percent, "Scheduled price refresh");
                }
            }
        }

        info!("Price refresh job stopped");
    })
}
