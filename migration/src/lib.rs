pub use sea_orm_migration::prelude::*;

mod m20261016_000001_create_accounts;
mod m20261016_000002_create_global_supply;
mod m20261016_000003_create_price_samples;
mod m20261016_000004_create_daily_price_records;
mod m20261016_000005_create_claim_events;
mod m20261016_000006_create_commission_records;
mod m20261016_000007_create_p2p_trades;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000001_create_accounts::Migration),
            Box::new(m20261016_000002_create_global_supply::Migration),
            Box::new(m20261016_000003_create_price_samples::Migration),
            Box::new(m20261016_000004_create_daily_price_records::Migration),
            Box::new(m20261016_000005_create_claim_events::Migration),
            Box::new(m20261016_000006_create_commission_records::Migration),
            Box::new(m20261016_000007_create_p2p_trades::Migration),
        ]
    }
}
