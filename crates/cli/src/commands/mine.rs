use cartwise_core::config::{ConfigOverrides, LoadOptions};
use cartwise_core::{DomainError, RecommendationEngine, RecommendationStats};
use cartwise_db::PurchaseHistory;
use serde::Serialize;

use crate::commands::{load_config, open_database, runtime, CommandResult, StepError};

#[derive(Debug, Clone, Copy, Default)]
pub struct MineArgs {
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
struct MineReport {
    total_orders: usize,
    min_support: f64,
    min_confidence: f64,
    #[serde(flatten)]
    stats: RecommendationStats,
}

pub fn run(args: MineArgs) -> CommandResult {
    let options = LoadOptions {
        overrides: ConfigOverrides {
            min_support: args.min_support,
            min_confidence: args.min_confidence,
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };
    let config = match load_config("mine", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("mine") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let history = PurchaseHistory::load_from_pool(&pool, 0)
            .await
            .map_err(|error| ("history_load", error.to_string(), 4u8));
        pool.close().await;
        history
    });

    let history = match result {
        Ok(history) => history,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("mine", error_class, message, exit_code);
        }
    };

    let engine = RecommendationEngine::from_config(&config);
    let stats = match engine.stats(&history.transactions).map_err(mining_error) {
        Ok(stats) => stats,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("mine", error_class, message, exit_code);
        }
    };

    let message = format!(
        "mined {} frequent itemsets and {} rules from {} transactions",
        stats.frequent_itemsets_count, stats.rules_count, stats.total_transactions
    );
    let report = MineReport {
        total_orders: history.orders,
        min_support: config.mining.min_support,
        min_confidence: config.mining.min_confidence,
        stats,
    };

    CommandResult::success_with_data("mine", message, serde_json::to_value(report).ok())
}

pub(crate) fn mining_error(error: DomainError) -> StepError {
    let error_class = match error {
        DomainError::InvalidThreshold { .. } => "config_validation",
        DomainError::CandidateLimitExceeded { .. } => "candidate_limit",
        DomainError::InvariantViolation(_) => "mining",
    };
    (error_class, error.to_string(), 7u8)
}
