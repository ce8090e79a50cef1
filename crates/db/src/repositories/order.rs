use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::Row;

use cartwise_core::domain::order::{Order, OrderId, OrderLine, OrderStatus};

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{value}`: {e}")))
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<(String, OrderLine), RepositoryError> {
    let order_id: String =
        row.try_get("order_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let item_name: String =
        row.try_get("item_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| RepositoryError::Decode(format!("invalid quantity {quantity}")))?;

    Ok((order_id, OrderLine { item_name, quantity }))
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO customer_order (id, status, placed_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 placed_at = excluded.placed_at",
        )
        .bind(&order.id.0)
        .bind(order.status.as_str())
        .bind(order.placed_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM order_line WHERE order_id = ?")
            .bind(&order.id.0)
            .execute(&mut *tx)
            .await?;

        for (line_number, line) in order.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_line (order_id, line_number, item_name, quantity)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&order.id.0)
            .bind(line_number as i64)
            .bind(&line.item_name)
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let order_rows = sqlx::query(
            "SELECT id, status, placed_at FROM customer_order
             WHERE status = ?
             ORDER BY placed_at ASC, id ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        let line_rows = sqlx::query(
            "SELECT l.order_id, l.item_name, l.quantity
             FROM order_line l
             JOIN customer_order o ON o.id = l.order_id
             WHERE o.status = ?
             ORDER BY l.order_id, l.line_number",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();
        for row in &line_rows {
            let (order_id, line) = row_to_line(row)?;
            lines_by_order.entry(order_id).or_default().push(line);
        }

        order_rows
            .iter()
            .map(|row| -> Result<Order, RepositoryError> {
                let id: String =
                    row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let status_str: String =
                    row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let placed_at_str: String =
                    row.try_get("placed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

                Ok(Order {
                    lines: lines_by_order.remove(&id).unwrap_or_default(),
                    status: status_str.parse().map_err(RepositoryError::Decode)?,
                    placed_at: parse_timestamp(&placed_at_str)?,
                    id: OrderId(id),
                })
            })
            .collect()
    }
}
