//! `SeaORM` Entity prelude

pub use super::accounts::Entity as Accounts;
pub use super::claim_events::Entity as ClaimEvents;
pub use super::commission_records::Entity as CommissionRecords;
pub use super::daily_price_records::Entity as DailyPriceRecords;
pub use super::global_supply::Entity as GlobalSupply;
pub use super::p2p_trades::Entity as P2pTrades;
pub use super::price_samples::Entity as PriceSamples;
