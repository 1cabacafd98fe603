pub mod claim;
pub mod commission;
pub mod error;
pub mod price;
