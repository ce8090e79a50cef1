pub mod connection;
pub mod fixtures;
pub mod history;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoDataset, SeedResult, VerificationResult};
pub use history::PurchaseHistory;
