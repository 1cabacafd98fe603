pub mod price_refresh;
