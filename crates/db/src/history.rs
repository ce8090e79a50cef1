use cartwise_core::domain::item::{Item, ItemId};
use cartwise_core::domain::order::OrderStatus;
use cartwise_core::{build_transactions, Catalog, ItemCatalog, PopularitySource, Transaction};
use tracing::debug;

use crate::connection::DbPool;
use crate::repositories::{
    ItemRepository, OrderRepository, RepositoryError, SqlItemRepository, SqlOrderRepository,
};

/// Catalog snapshot and delivered-order transactions for one mining request.
///
/// The popularity ranking comes from the item store's own ordering and is
/// what the fallback path serves.
#[derive(Debug, Clone)]
pub struct PurchaseHistory {
    /// Delivered orders read, including any that produced no transaction
    pub orders: usize,
    pub catalog: Catalog,
    pub transactions: Vec<Transaction>,
    popular: Vec<Item>,
}

impl PurchaseHistory {
    /// Load history with the `popular_limit` most popular items ranked.
    pub async fn load(
        items: &dyn ItemRepository,
        orders: &dyn OrderRepository,
        popular_limit: usize,
    ) -> Result<Self, RepositoryError> {
        let catalog = Catalog::new(items.list_all().await?);
        let popular = items.list_popular(popular_limit).await?;
        let delivered = orders.list_by_status(OrderStatus::Delivered).await?;
        let transactions = build_transactions(&delivered, &catalog);

        debug!(
            event_name = "db.history.loaded",
            orders = delivered.len(),
            transactions = transactions.len(),
            catalog_items = catalog.len(),
            "purchase history loaded"
        );

        Ok(Self { orders: delivered.len(), catalog, transactions, popular })
    }

    pub async fn load_from_pool(pool: &DbPool, popular_limit: usize) -> Result<Self, RepositoryError> {
        let items = SqlItemRepository::new(pool.clone());
        let orders = SqlOrderRepository::new(pool.clone());
        Self::load(&items, &orders, popular_limit).await
    }
}

impl ItemCatalog for PurchaseHistory {
    fn item(&self, id: &ItemId) -> Option<&Item> {
        self.catalog.item(id)
    }
}

impl PopularitySource for PurchaseHistory {
    fn popular_items(&self, limit: usize) -> Vec<Item> {
        self.popular.iter().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use cartwise_core::domain::item::{Item, ItemId};
    use cartwise_core::domain::order::{Order, OrderId, OrderLine, OrderStatus};
    use cartwise_core::{ItemCatalog, PopularitySource};

    use super::PurchaseHistory;
    use crate::repositories::{
        InMemoryItemRepository, InMemoryOrderRepository, ItemRepository, OrderRepository,
    };

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: ItemId::from(id),
            name: name.to_string(),
            price: Decimal::new(400, 2),
            hearts: name.len() as u32,
            rating: 4.0,
            available: true,
        }
    }

    fn order(id: &str, status: OrderStatus, names: &[&str]) -> Order {
        Order {
            id: OrderId(id.to_string()),
            status,
            lines: names
                .iter()
                .map(|name| OrderLine { item_name: name.to_string(), quantity: 1 })
                .collect(),
            placed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn only_delivered_orders_become_transactions() {
        let items = InMemoryItemRepository::default();
        items.save(item("itm-latte", "Latte")).await.expect("save latte");
        items.save(item("itm-scone", "Scone")).await.expect("save scone");

        let orders = InMemoryOrderRepository::default();
        orders
            .save(order("o-1", OrderStatus::Delivered, &["Latte", "Scone"]))
            .await
            .expect("save o-1");
        orders.save(order("o-2", OrderStatus::Pending, &["Latte"])).await.expect("save o-2");
        orders.save(order("o-3", OrderStatus::Delivered, &["Mystery"])).await.expect("save o-3");

        let history = PurchaseHistory::load(&items, &orders, 5).await.expect("load history");

        assert_eq!(history.orders, 2);
        assert_eq!(history.transactions.len(), 1);
        assert!(history.transactions[0].contains(&ItemId::from("itm-scone")));
        assert!(history.catalog.item(&ItemId::from("itm-latte")).is_some());
    }

    #[tokio::test]
    async fn popular_items_follow_the_item_store_ranking() {
        let items = InMemoryItemRepository::default();
        items.save(item("itm-tea", "Tea")).await.expect("save tea");
        items.save(item("itm-croissant", "Croissant")).await.expect("save croissant");
        items.save(item("itm-latte", "Latte")).await.expect("save latte");
        let orders = InMemoryOrderRepository::default();

        let history = PurchaseHistory::load(&items, &orders, 2).await.expect("load history");

        let ids: Vec<ItemId> = history.popular_items(10).into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![ItemId::from("itm-croissant"), ItemId::from("itm-latte")]);
        assert_eq!(history.popular_items(1).len(), 1);
    }
}
