//! Recommendation API routes.
//!
//! JSON API Endpoints:
//! - `POST /api/recommendations`        : rank items for a cart
//! - `POST /api/recommendations/train`  : run a mining pass and report counts
//! - `GET  /api/recommendations/stats`  : strongest combinations and rules
//!
//! Every request reloads delivered orders and the catalog, so results always
//! reflect the current history. Mining results are reused only through the
//! engine's cache.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cartwise_core::domain::item::{Item, ItemId};
use cartwise_core::{
    ApplicationError, Basket, EnrichedRecommendation, InterfaceError, ItemResolver,
    RecommendationEngine, RecommendationOutcome, RecommendationStats, TrainingSummary,
};
use cartwise_db::{DbPool, PurchaseHistory};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct RecommendationState {
    db_pool: DbPool,
    engine: Arc<RecommendationEngine>,
}

impl RecommendationState {
    pub fn new(db_pool: DbPool, engine: Arc<RecommendationEngine>) -> Self {
        Self { db_pool, engine }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// Item ids or display names currently in the cart
    #[serde(default)]
    pub cart_items: Vec<String>,
}

/// Mined recommendations carry metrics; fallback items are plain catalog records.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecommendedItems {
    Mined(Vec<EnrichedRecommendation>),
    Popular(Vec<Item>),
}

#[derive(Debug, Serialize)]
pub struct RecommendDebug {
    pub total_orders: usize,
    pub total_transactions: usize,
    pub rules_generated: usize,
    pub recommendations_returned: usize,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub recommendations: RecommendedItems,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<RecommendDebug>,
}

#[derive(Debug, Serialize)]
pub struct TrainStats {
    pub total_orders: usize,
    #[serde(flatten)]
    pub summary: TrainingSummary,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TrainStats>,
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
    pub total_orders: usize,
    #[serde(flatten)]
    pub stats: RecommendationStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsBody,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: RecommendationState) -> Router {
    Router::new()
        .route("/api/recommendations", post(recommend))
        .route("/api/recommendations/train", post(train))
        .route("/api/recommendations/stats", get(stats))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn recommend(
    State(state): State<RecommendationState>,
    Json(body): Json<RecommendRequest>,
) -> ApiResult<RecommendResponse> {
    let history = load_history(&state).await.map_err(|e| api_error(e, "recommend"))?;
    let basket = Basket::new(body.cart_items.iter().map(|reference| {
        history.catalog.resolve(reference).unwrap_or_else(|| ItemId::from(reference.trim()))
    }));

    let outcome = state
        .engine
        .recommend_for(&history.transactions, &basket, &history)
        .map_err(|e| api_error(ApplicationError::from(e), "recommend"))?;

    let response = match outcome {
        RecommendationOutcome::Mined { recommendations, summary } => RecommendResponse {
            success: true,
            fallback: false,
            message: None,
            debug: Some(RecommendDebug {
                total_orders: history.orders,
                total_transactions: summary.total_transactions,
                rules_generated: summary.rules_generated,
                recommendations_returned: summary.recommendations_returned,
            }),
            recommendations: RecommendedItems::Mined(recommendations),
        },
        RecommendationOutcome::Fallback { items, reason } => RecommendResponse {
            success: true,
            fallback: true,
            message: Some(reason.message().to_string()),
            debug: None,
            recommendations: RecommendedItems::Popular(items),
        },
    };

    Ok(Json(response))
}

pub async fn train(State(state): State<RecommendationState>) -> ApiResult<TrainResponse> {
    let history = load_history(&state).await.map_err(|e| api_error(e, "train"))?;

    if history.orders == 0 {
        return Ok(Json(TrainResponse {
            success: false,
            message: "No order history available for training".to_string(),
            stats: None,
        }));
    }

    let summary = state
        .engine
        .train(&history.transactions)
        .map_err(|e| api_error(ApplicationError::from(e), "train"))?;

    info!(
        event_name = "api.recommendations.trained",
        orders = history.orders,
        transactions = summary.total_transactions,
        frequent_itemsets = summary.frequent_itemsets_count,
        rules = summary.rules_count,
        "recommendation model trained"
    );

    Ok(Json(TrainResponse {
        success: true,
        message: "Model trained successfully".to_string(),
        stats: Some(TrainStats { total_orders: history.orders, summary }),
    }))
}

pub async fn stats(State(state): State<RecommendationState>) -> ApiResult<StatsResponse> {
    let history = load_history(&state).await.map_err(|e| api_error(e, "stats"))?;

    if history.orders == 0 {
        return Ok(Json(StatsResponse {
            success: true,
            stats: StatsBody {
                total_orders: 0,
                stats: RecommendationStats::default(),
                message: Some("No order history available".to_string()),
            },
        }));
    }

    let stats = state
        .engine
        .stats(&history.transactions)
        .map_err(|e| api_error(ApplicationError::from(e), "stats"))?;

    Ok(Json(StatsResponse {
        success: true,
        stats: StatsBody { total_orders: history.orders, stats, message: None },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_history(state: &RecommendationState) -> Result<PurchaseHistory, ApplicationError> {
    PurchaseHistory::load_from_pool(&state.db_pool, state.engine.settings().fallback_limit)
        .await
        .map_err(|error| ApplicationError::Persistence(error.to_string()))
}

fn api_error(error: ApplicationError, operation: &'static str) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(Uuid::new_v4().to_string());
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error!(
        event_name = "api.recommendations.error",
        operation,
        correlation_id = %interface.correlation_id(),
        status = status.as_u16(),
        error = %interface,
        "recommendation request failed"
    );

    (
        status,
        Json(ApiError {
            success: false,
            error: interface.user_message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use cartwise_core::{EngineSettings, MiningParams, RecommendationEngine};
    use cartwise_db::{connect_with_settings, migrations, DbPool, DemoDataset};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, RecommendationState};

    async fn empty_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    async fn seeded_pool() -> DbPool {
        let pool = empty_pool().await;
        DemoDataset::load(&pool).await.expect("seed demo dataset");
        pool
    }

    fn app(pool: DbPool) -> Router {
        router(RecommendationState::new(pool, Arc::new(RecommendationEngine::default())))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router response");
        let status = response.status();
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("response body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn recommend_returns_mined_items_for_known_pairing() {
        let (status, body) = send(
            app(seeded_pool().await),
            post_json("/api/recommendations", json!({ "cart_items": ["itm-bagel"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["fallback"], false);
        assert_eq!(body["recommendations"][0]["item"]["id"], "itm-cream-cheese");
        assert_eq!(body["recommendations"][0]["confidence_percent"], 100);
        assert_eq!(body["debug"]["total_orders"], 12);
        assert_eq!(body["debug"]["total_transactions"], 12);
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn recommend_resolves_cart_items_by_display_name() {
        let (status, body) = send(
            app(seeded_pool().await),
            post_json("/api/recommendations", json!({ "cart_items": ["everything bagel"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendations"][0]["item"]["id"], "itm-cream-cheese");
        assert_eq!(body["recommendations"][0]["based_on_names"][0], "Everything Bagel");
    }

    #[tokio::test]
    async fn recommend_falls_back_without_history() {
        let (status, body) = send(
            app(empty_pool().await),
            post_json("/api/recommendations", json!({ "cart_items": ["itm-latte"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["fallback"], true);
        assert_eq!(body["message"], "Showing popular items (insufficient order history)");
        assert_eq!(body["recommendations"], json!([]));
        assert!(body.get("debug").is_none());
    }

    #[tokio::test]
    async fn recommend_falls_back_to_popular_items_for_unrelated_cart() {
        let (status, body) = send(
            app(seeded_pool().await),
            post_json("/api/recommendations", json!({ "cart_items": ["not-on-the-menu"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
        assert_eq!(body["message"], "Showing popular items (no related purchases found)");
        assert_eq!(body["recommendations"][0]["id"], "itm-latte");
        assert_eq!(body["recommendations"].as_array().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn recommend_rejects_invalid_thresholds_with_bad_request() {
        let engine = RecommendationEngine::new(EngineSettings {
            mining: MiningParams::new(1.5, 0.6),
            ..EngineSettings::default()
        });
        let app = router(RecommendationState::new(seeded_pool().await, Arc::new(engine)));

        let (status, body) =
            send(app, post_json("/api/recommendations", json!({ "cart_items": [] }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn recommend_reports_service_unavailable_when_database_is_closed() {
        let pool = empty_pool().await;
        pool.close().await;

        let (status, body) = send(
            app(pool),
            post_json("/api/recommendations", json!({ "cart_items": ["itm-latte"] })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["error"],
            "Recommendations are temporarily unavailable. Please retry shortly."
        );
    }

    #[tokio::test]
    async fn train_without_orders_reports_failure_message() {
        let (status, body) = send(
            app(empty_pool().await),
            post_json("/api/recommendations/train", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No order history available for training");
        assert!(body.get("stats").is_none());
    }

    #[tokio::test]
    async fn train_reports_mining_counts() {
        let (status, body) = send(
            app(seeded_pool().await),
            post_json("/api/recommendations/train", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["stats"]["total_orders"], 12);
        assert_eq!(body["stats"]["total_transactions"], 12);
        assert!(body["stats"]["rules_count"].as_u64().is_some_and(|rules| rules > 0));
    }

    #[tokio::test]
    async fn stats_lists_multi_item_combinations() {
        let (status, body) = send(app(seeded_pool().await), get("/api/recommendations/stats")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let combinations = body["stats"]["top_combinations"].as_array().expect("combinations");
        assert!(!combinations.is_empty());
        assert!(combinations
            .iter()
            .all(|itemset| itemset["items"].as_array().is_some_and(|items| items.len() >= 2)));
        assert!(body["stats"].get("message").is_none());
    }

    #[tokio::test]
    async fn stats_without_orders_reports_empty_history() {
        let (status, body) = send(app(empty_pool().await), get("/api/recommendations/stats")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_orders"], 0);
        assert_eq!(body["stats"]["message"], "No order history available");
    }
}
