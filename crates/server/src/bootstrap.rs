use std::sync::Arc;

use cartwise_core::config::{AppConfig, ConfigError, LoadOptions};
use cartwise_core::RecommendationEngine;
use cartwise_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<RecommendationEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let engine = Arc::new(RecommendationEngine::from_config(&config));
    info!(
        event_name = "system.bootstrap.engine_ready",
        correlation_id = "bootstrap",
        counting = ?config.mining.counting,
        cache_enabled = config.cache.enabled,
        min_support = config.mining.min_support,
        min_confidence = config.mining.min_confidence,
        "recommendation engine configured"
    );

    Ok(Application { config, db_pool, engine })
}

#[cfg(test)]
mod tests {
    use cartwise_core::config::{ConfigOverrides, LoadOptions};
    use cartwise_core::CountingStrategy;

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_rejects_out_of_range_thresholds() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                min_support: Some(1.5),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("mining.min_support"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_configures_engine() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                counting: Some(CountingStrategy::TidSet),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('item', 'customer_order', 'order_line')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected catalog and order tables after bootstrap");
        assert_eq!(table_count, 3);
        assert_eq!(app.engine.settings().strategy, CountingStrategy::TidSet);

        app.db_pool.close().await;
    }
}
