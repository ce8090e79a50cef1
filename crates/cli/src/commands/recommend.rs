use cartwise_core::config::LoadOptions;
use cartwise_core::domain::item::ItemId;
use cartwise_core::{Basket, ItemResolver, RecommendationEngine, RecommendationOutcome};
use cartwise_db::PurchaseHistory;

use crate::commands::mine::mining_error;
use crate::commands::{load_config, open_database, runtime, CommandResult};

pub fn run(items: &[String]) -> CommandResult {
    let config = match load_config("recommend", LoadOptions::default()) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("recommend") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let history = PurchaseHistory::load_from_pool(&pool, config.recommend.fallback_limit)
            .await
            .map_err(|error| ("history_load", error.to_string(), 4u8));
        pool.close().await;
        history
    });

    let history = match result {
        Ok(history) => history,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("recommend", error_class, message, exit_code);
        }
    };

    let basket = Basket::new(items.iter().map(|reference| {
        history.catalog.resolve(reference).unwrap_or_else(|| ItemId::from(reference.trim()))
    }));

    let engine = RecommendationEngine::from_config(&config);
    let outcome = match engine
        .recommend_for(&history.transactions, &basket, &history)
        .map_err(mining_error)
    {
        Ok(outcome) => outcome,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("recommend", error_class, message, exit_code);
        }
    };

    CommandResult::success_with_data(
        "recommend",
        summary_message(&outcome),
        serde_json::to_value(&outcome).ok(),
    )
}

fn summary_message(outcome: &RecommendationOutcome) -> String {
    match outcome {
        RecommendationOutcome::Mined { recommendations, summary } => format!(
            "{} recommendations from {} rules over {} transactions",
            recommendations.len(),
            summary.rules_generated,
            summary.total_transactions
        ),
        RecommendationOutcome::Fallback { reason, .. } => reason.message().to_string(),
    }
}
