//! Readiness check for load balancers and operators.
//!
//! A reachable database with fewer than `recommend.min_history` usable
//! transactions still answers 200: every recommendation request is served
//! from the popularity ranking until enough orders are delivered.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use cartwise_db::{DbPool, PurchaseHistory};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    min_history: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Mined recommendations can be served
    Ready,
    /// Only popularity fallbacks can be served
    FallbackOnly,
    /// Purchase history could not be read
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderHistoryCheck {
    pub delivered_orders: usize,
    pub transactions: usize,
    pub min_history: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: Readiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_history: Option<OrderHistoryCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, min_history: usize) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, min_history })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let checked_at = Utc::now().to_rfc3339();

    let history = match PurchaseHistory::load_from_pool(&state.db_pool, 0).await {
        Ok(history) => history,
        Err(error) => {
            warn!(
                event_name = "system.health.degraded",
                error = %error,
                "purchase history is unreadable"
            );
            let report = HealthReport {
                status: Readiness::Unavailable,
                order_history: None,
                detail: Some(format!("purchase history unavailable: {error}")),
                checked_at,
            };
            return (StatusCode::SERVICE_UNAVAILABLE, Json(report));
        }
    };

    let check = OrderHistoryCheck {
        delivered_orders: history.orders,
        transactions: history.transactions.len(),
        min_history: state.min_history,
    };
    let status = readiness(&check);
    if status == Readiness::FallbackOnly {
        debug!(
            event_name = "system.health.fallback_only",
            transactions = check.transactions,
            min_history = check.min_history,
            "not enough history for mined recommendations"
        );
    }

    let report = HealthReport { status, order_history: Some(check), detail: None, checked_at };
    (StatusCode::OK, Json(report))
}

fn readiness(check: &OrderHistoryCheck) -> Readiness {
    if check.transactions >= check.min_history {
        Readiness::Ready
    } else {
        Readiness::FallbackOnly
    }
}
