use async_trait::async_trait;
use thiserror::Error;

use cartwise_core::domain::item::Item;
use cartwise_core::domain::order::{Order, OrderStatus};

pub mod item;
pub mod memory;
pub mod order;

pub use item::SqlItemRepository;
pub use memory::{InMemoryItemRepository, InMemoryOrderRepository};
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Catalog storage
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Item>, RepositoryError>;
    /// Items by hearts then rating, both descending
    async fn list_popular(&self, limit: usize) -> Result<Vec<Item>, RepositoryError>;
    async fn save(&self, item: Item) -> Result<(), RepositoryError>;
}

/// Order history storage
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save(&self, order: Order) -> Result<(), RepositoryError>;
    /// Orders with `status`, oldest first
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;
}
