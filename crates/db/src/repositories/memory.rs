use std::collections::HashMap;

use tokio::sync::RwLock;

use cartwise_core::domain::item::Item;
use cartwise_core::domain::order::{Order, OrderStatus};
use cartwise_core::recommend::popularity_ranking;

use super::{ItemRepository, OrderRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryItemRepository {
    items: RwLock<HashMap<String, Item>>,
}

#[async_trait::async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let items = self.items.read().await;
        let mut all: Vec<Item> = items.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn list_popular(&self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        let items = self.items.read().await;
        Ok(popularity_ranking(items.values().cloned(), limit))
    }

    async fn save(&self, item: Item) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        items.insert(item.id.0.clone(), item);
        Ok(())
    }
}

/// Orders kept in insertion order; saving an existing id replaces it in place
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|existing| existing.id == order.id) {
            Some(existing) => *existing = order,
            None => orders.push(order),
        }
        Ok(())
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> =
            orders.iter().filter(|order| order.status == status).cloned().collect();
        matching.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use cartwise_core::domain::item::{Item, ItemId};
    use cartwise_core::domain::order::{Order, OrderId, OrderLine, OrderStatus};

    use crate::repositories::{
        InMemoryItemRepository, InMemoryOrderRepository, ItemRepository, OrderRepository,
    };

    fn item(id: &str, name: &str, hearts: u32) -> Item {
        Item {
            id: ItemId(id.to_string()),
            name: name.to_string(),
            price: Decimal::new(300, 2),
            hearts,
            rating: 4.0,
            available: true,
        }
    }

    #[tokio::test]
    async fn in_memory_item_repo_round_trip() {
        let repo = InMemoryItemRepository::default();
        let latte = item("itm-latte", "Latte", 4);

        repo.save(latte.clone()).await.expect("save item");

        repo.save(Item { hearts: 9, ..latte.clone() }).await.expect("upsert item");

        let all = repo.list_all().await.expect("list items");
        assert_eq!(all, vec![Item { hearts: 9, ..latte }]);
    }

    #[tokio::test]
    async fn in_memory_popular_items_are_ranked() {
        let repo = InMemoryItemRepository::default();
        repo.save(item("a", "Bagel", 1)).await.expect("save a");
        repo.save(item("b", "Muffin", 9)).await.expect("save b");
        repo.save(item("c", "Scone", 5)).await.expect("save c");

        let popular = repo.list_popular(2).await.expect("list popular");

        let ids: Vec<&str> = popular.iter().map(|item| item.id.0.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn in_memory_order_repo_filters_by_status() {
        let repo = InMemoryOrderRepository::default();
        let order = |id: &str, status| Order {
            id: OrderId(id.to_string()),
            status,
            lines: vec![OrderLine { item_name: "Latte".to_string(), quantity: 1 }],
            placed_at: Utc::now(),
        };

        repo.save(order("ord-1", OrderStatus::Delivered)).await.expect("save 1");
        repo.save(order("ord-2", OrderStatus::Cancelled)).await.expect("save 2");
        repo.save(order("ord-2", OrderStatus::Delivered)).await.expect("upsert 2");

        let delivered = repo.list_by_status(OrderStatus::Delivered).await.expect("list");
        assert_eq!(delivered.len(), 2);
        assert!(repo.list_by_status(OrderStatus::Cancelled).await.expect("list").is_empty());
    }
}
