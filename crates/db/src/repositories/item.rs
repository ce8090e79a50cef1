use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use cartwise_core::domain::item::{Item, ItemId};

use super::{ItemRepository, RepositoryError};
use crate::DbPool;

const ITEM_COLUMNS: &str = "id, name, price, hearts, rating, available";

pub struct SqlItemRepository {
    pool: DbPool,
}

impl SqlItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_str: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let hearts: i64 = row.try_get("hearts").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rating: f64 = row.try_get("rating").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let available: bool =
        row.try_get("available").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let price = Decimal::from_str(&price_str)
        .map_err(|e| RepositoryError::Decode(format!("invalid price `{price_str}` for item `{id}`: {e}")))?;
    let hearts = u32::try_from(hearts)
        .map_err(|_| RepositoryError::Decode(format!("invalid hearts count {hearts} for item `{id}`")))?;

    Ok(Item { id: ItemId(id), name, price, hearts, rating, available })
}

#[async_trait::async_trait]
impl ItemRepository for SqlItemRepository {
    async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM item ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn list_popular(&self, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM item ORDER BY hearts DESC, rating DESC, id ASC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn save(&self, item: Item) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO item (id, name, price, hearts, rating, available)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price = excluded.price,
                 hearts = excluded.hearts,
                 rating = excluded.rating,
                 available = excluded.available",
        )
        .bind(&item.id.0)
        .bind(&item.name)
        .bind(item.price.to_string())
        .bind(i64::from(item.hearts))
        .bind(item.rating)
        .bind(item.available)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
