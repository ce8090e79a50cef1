use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use cartwise_core::domain::item::{Item, ItemId};
use cartwise_core::domain::order::{Order, OrderId, OrderLine, OrderStatus};

use crate::connection::DbPool;
use crate::repositories::{
    ItemRepository, OrderRepository, RepositoryError, SqlItemRepository, SqlOrderRepository,
};

/// 2026-01-05T08:00:00Z
const DEMO_EPOCH_SECS: i64 = 1_767_600_000;

struct ItemSeed {
    id: &'static str,
    name: &'static str,
    price_cents: i64,
    hearts: u32,
    rating: f64,
}

struct OrderSeed {
    id: &'static str,
    status: OrderStatus,
    items: &'static [&'static str],
}

const DEMO_ITEMS: &[ItemSeed] = &[
    ItemSeed { id: "itm-espresso", name: "Espresso", price_cents: 300, hearts: 24, rating: 4.7 },
    ItemSeed { id: "itm-latte", name: "Latte", price_cents: 450, hearts: 42, rating: 4.8 },
    ItemSeed { id: "itm-cappuccino", name: "Cappuccino", price_cents: 425, hearts: 31, rating: 4.6 },
    ItemSeed {
        id: "itm-croissant",
        name: "Butter Croissant",
        price_cents: 350,
        hearts: 38,
        rating: 4.5,
    },
    ItemSeed {
        id: "itm-muffin",
        name: "Blueberry Muffin",
        price_cents: 325,
        hearts: 17,
        rating: 4.2,
    },
    ItemSeed { id: "itm-bagel", name: "Everything Bagel", price_cents: 300, hearts: 12, rating: 4.0 },
    ItemSeed { id: "itm-cream-cheese", name: "Cream Cheese", price_cents: 100, hearts: 6, rating: 4.1 },
    ItemSeed { id: "itm-orange-juice", name: "Orange Juice", price_cents: 375, hearts: 9, rating: 4.3 },
    ItemSeed { id: "itm-green-tea", name: "Green Tea", price_cents: 275, hearts: 14, rating: 4.4 },
    ItemSeed { id: "itm-scone", name: "Lemon Scone", price_cents: 325, hearts: 11, rating: 4.1 },
];

const DEMO_ORDERS: &[OrderSeed] = &[
    OrderSeed { id: "ord-001", status: OrderStatus::Delivered, items: &["Latte", "Butter Croissant"] },
    OrderSeed { id: "ord-002", status: OrderStatus::Delivered, items: &["Latte", "Butter Croissant"] },
    OrderSeed {
        id: "ord-003",
        status: OrderStatus::Delivered,
        items: &["Latte", "Butter Croissant", "Orange Juice"],
    },
    OrderSeed {
        id: "ord-004",
        status: OrderStatus::Delivered,
        items: &["Everything Bagel", "Cream Cheese"],
    },
    OrderSeed {
        id: "ord-005",
        status: OrderStatus::Delivered,
        items: &["Everything Bagel", "Cream Cheese", "Espresso"],
    },
    OrderSeed {
        id: "ord-006",
        status: OrderStatus::Delivered,
        items: &["Cappuccino", "Blueberry Muffin"],
    },
    OrderSeed { id: "ord-007", status: OrderStatus::Delivered, items: &["Green Tea", "Lemon Scone"] },
    OrderSeed { id: "ord-008", status: OrderStatus::Delivered, items: &["Latte", "Blueberry Muffin"] },
    OrderSeed { id: "ord-009", status: OrderStatus::Delivered, items: &["Espresso", "Butter Croissant"] },
    OrderSeed {
        id: "ord-010",
        status: OrderStatus::Delivered,
        items: &["Cappuccino", "Butter Croissant"],
    },
    OrderSeed {
        id: "ord-011",
        status: OrderStatus::Delivered,
        items: &["Everything Bagel", "Cream Cheese", "Orange Juice"],
    },
    OrderSeed {
        id: "ord-012",
        status: OrderStatus::Delivered,
        items: &["Green Tea", "Lemon Scone", "Seasonal Special"],
    },
    OrderSeed { id: "ord-013", status: OrderStatus::Pending, items: &["Latte"] },
    OrderSeed {
        id: "ord-014",
        status: OrderStatus::Cancelled,
        items: &["Espresso", "Blueberry Muffin"],
    },
];

/// Deterministic cafe catalog and order history for demos and smoke tests.
///
/// Loading is idempotent: every record is upserted by id. One delivered
/// order references an item that is not in the catalog, so transaction
/// building has an unresolved line to skip.
pub struct DemoDataset;

impl DemoDataset {
    pub fn items() -> Vec<Item> {
        DEMO_ITEMS
            .iter()
            .map(|seed| Item {
                id: ItemId(seed.id.to_string()),
                name: seed.name.to_string(),
                price: Decimal::new(seed.price_cents, 2),
                hearts: seed.hearts,
                rating: seed.rating,
                available: true,
            })
            .collect()
    }

    pub fn orders() -> Result<Vec<Order>, RepositoryError> {
        DEMO_ORDERS
            .iter()
            .enumerate()
            .map(|(index, seed)| {
                let offset = i64::try_from(index).unwrap_or(i64::MAX / 3600) * 3600;
                let placed_at = DateTime::<Utc>::from_timestamp(DEMO_EPOCH_SECS + offset, 0)
                    .ok_or_else(|| {
                        RepositoryError::Decode(format!("invalid demo timestamp for `{}`", seed.id))
                    })?;
                Ok(Order {
                    id: OrderId(seed.id.to_string()),
                    status: seed.status,
                    lines: seed
                        .items
                        .iter()
                        .map(|name| OrderLine { item_name: name.to_string(), quantity: 1 })
                        .collect(),
                    placed_at,
                })
            })
            .collect()
    }

    pub fn delivered_order_count() -> usize {
        DEMO_ORDERS.iter().filter(|seed| seed.status.is_completed()).count()
    }

    /// Upsert the demo catalog and orders.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let items = SqlItemRepository::new(pool.clone());
        for item in Self::items() {
            items.save(item).await?;
        }

        let orders = SqlOrderRepository::new(pool.clone());
        for order in Self::orders()? {
            orders.save(order).await?;
        }

        let result = SeedResult {
            items_seeded: DEMO_ITEMS.len(),
            orders_seeded: DEMO_ORDERS.len(),
            delivered_orders: Self::delivered_order_count(),
        };
        info!(
            event_name = "db.seed.loaded",
            items = result.items_seeded,
            orders = result.orders_seeded,
            delivered = result.delivered_orders,
            "demo dataset loaded"
        );
        Ok(result)
    }

    /// Check that every demo record is present with its expected shape.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let item_ids = sql_array_from_ids(DEMO_ITEMS.iter().map(|seed| seed.id));
        let item_count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(1) FROM item WHERE id IN {item_ids}"))
                .fetch_one(pool)
                .await?;
        checks.push(("catalog-items", item_count == DEMO_ITEMS.len() as i64));

        for seed in DEMO_ORDERS {
            let order_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customer_order WHERE id = ?1 AND status = ?2)",
            )
            .bind(seed.id)
            .bind(seed.status.as_str())
            .fetch_one(pool)
            .await?;

            let line_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM order_line WHERE order_id = ?1")
                    .bind(seed.id)
                    .fetch_one(pool)
                    .await?;

            checks.push((seed.id, order_ok == 1 && line_count == seed.items.len() as i64));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

fn sql_array_from_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let quoted = ids.map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub items_seeded: usize,
    pub orders_seeded: usize,
    pub delivered_orders: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use cartwise_core::recommend::{Basket, Catalog, RecommendationOutcome};
    use cartwise_core::{build_transactions, RecommendationEngine};

    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = seeded_pool().await;

        let first = DemoDataset::load(&pool).await.expect("load demo dataset");
        let first_verification = DemoDataset::verify(&pool).await.expect("verify demo dataset");
        assert!(first_verification.all_present);
        assert_eq!(first.delivered_orders, 12);

        DemoDataset::load(&pool).await.expect("reload demo dataset");
        let second_verification = DemoDataset::verify(&pool).await.expect("re-verify demo dataset");
        assert!(second_verification.all_present);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn verify_reports_missing_records() {
        let pool = seeded_pool().await;

        let verification = DemoDataset::verify(&pool).await.expect("verify empty database");

        assert!(!verification.all_present);
        assert!(verification.checks.iter().any(|(name, ok)| *name == "catalog-items" && !ok));
    }

    #[tokio::test]
    async fn demo_history_yields_mined_recommendations() {
        let pool = seeded_pool().await;
        DemoDataset::load(&pool).await.expect("load demo dataset");

        let items = SqlItemRepository::new(pool.clone()).list_all().await.expect("list items");
        let orders = SqlOrderRepository::new(pool)
            .list_by_status(OrderStatus::Delivered)
            .await
            .expect("list delivered orders");
        let catalog = Catalog::new(items);
        let transactions = build_transactions(&orders, &catalog);
        assert_eq!(transactions.len(), 12);

        let outcome = RecommendationEngine::default()
            .recommend_for(&transactions, &Basket::new(["itm-bagel"]), &catalog)
            .expect("recommendation run");

        let RecommendationOutcome::Mined { recommendations, .. } = outcome else {
            panic!("expected mined recommendations for the demo history");
        };
        assert_eq!(recommendations[0].item.id, ItemId::from("itm-cream-cheese"));
        assert_eq!(recommendations[0].confidence_percent, 100);
    }
}
