use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zirox_backend::config::AppConfig;
use zirox_backend::jobs::price_refresh::start_price_refresh_job;
use zirox_backend::store::{MemoryStore, PlatformStore, SeaOrmStore};
use zirox_backend::{AppState, app_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zirox_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn PlatformStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(database_url).await?;

            tracing::info!("Running migrations...");
            migration::Migrator::up(&db, None).await?;

            Arc::new(SeaOrmStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; state is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let supply = store.ensure_global_supply(config.claim.max_supply).await?;
    tracing::info!(
        total_claimed = %supply.total_claimed,
        max_supply = %supply.max_supply,
        "Global supply ready"
    );

    let state = AppState::new(store, &config);

    if let Some(every) = config.price.refresh_interval {
        let _refresh_job = start_price_refresh_job(state.oracle.clone(), every);
    }

    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        strategy = config.price.strategy.as_str(),
        "Server listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
