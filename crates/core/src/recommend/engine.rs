//! Recommendation engine: mining, scoring, enrichment and the fallback policy

use std::sync::Arc;

use tracing::info;

use super::catalog::ItemCatalog;
use super::enrich::enrich;
use super::fallback::PopularitySource;
use super::scorer::recommend;
use super::types::{
    Basket, FallbackReason, RecommendationOutcome, RecommendationStats, RunSummary,
    TrainingSummary,
};
use super::{DEFAULT_FALLBACK_LIMIT, DEFAULT_RECOMMENDATION_LIMIT, MIN_HISTORY_TRANSACTIONS};
use crate::cache::{CachedMiner, InMemoryMiningCache, MiningCache, NoopMiningCache};
use crate::config::AppConfig;
use crate::mining::{CountingStrategy, Itemset, Miner, MiningParams, MiningResult};
use crate::transactions::Transaction;

/// Number of combinations and rules reported by [`RecommendationEngine::stats`]
pub const STATS_TOP_N: usize = 10;

/// Tunables for a [`RecommendationEngine`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub mining: MiningParams,
    pub strategy: CountingStrategy,
    /// Maximum mined recommendations returned
    pub limit: usize,
    /// Maximum popularity-ranked items returned on fallback
    pub fallback_limit: usize,
    /// Fewer transactions than this always falls back
    pub min_history: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mining: MiningParams::default(),
            strategy: CountingStrategy::default(),
            limit: DEFAULT_RECOMMENDATION_LIMIT,
            fallback_limit: DEFAULT_FALLBACK_LIMIT,
            min_history: MIN_HISTORY_TRANSACTIONS,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mining: config.mining.params(),
            strategy: config.mining.counting,
            limit: config.recommend.limit,
            fallback_limit: config.recommend.fallback_limit,
            min_history: config.recommend.min_history,
        }
    }
}

/// Stateless recommendation pipeline.
///
/// Each call receives the full transaction history and catalog snapshot.
/// Mining results are only reused when a [`MiningCache`] is attached.
#[derive(Debug)]
pub struct RecommendationEngine {
    settings: EngineSettings,
    miner: CachedMiner,
}

impl RecommendationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_cache(settings, Arc::new(NoopMiningCache))
    }

    pub fn with_cache(settings: EngineSettings, cache: Arc<dyn MiningCache>) -> Self {
        let miner = Miner::new(settings.mining).with_strategy(settings.strategy);
        Self { settings, miner: CachedMiner::new(miner, cache) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let settings = EngineSettings::from_config(config);
        if config.cache.enabled {
            Self::with_cache(settings, Arc::new(InMemoryMiningCache::new(config.cache.capacity)))
        } else {
            Self::new(settings)
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Drop memoized mining results; call after new transactions are recorded.
    pub fn invalidate(&self) {
        self.miner.invalidate();
    }

    /// Recommend items for `basket` from `transactions`.
    ///
    /// Thresholds are validated before anything else. Below the history
    /// minimum, or when no rule yields a catalog item for the basket, the
    /// popularity ranking is returned instead.
    pub fn recommend_for<C>(
        &self,
        transactions: &[Transaction],
        basket: &Basket,
        catalog: &C,
    ) -> MiningResult<RecommendationOutcome>
    where
        C: ItemCatalog + PopularitySource + ?Sized,
    {
        self.settings.mining.validate()?;

        if transactions.len() < self.settings.min_history {
            return Ok(self.fallback(catalog, FallbackReason::InsufficientHistory, transactions.len()));
        }

        let outcome = self.miner.mine(transactions)?;
        let scored = recommend(basket, &outcome.rules, self.settings.limit);
        let recommendations = enrich(&scored, &outcome.rules, transactions, basket, catalog);

        if recommendations.is_empty() {
            return Ok(self.fallback(catalog, FallbackReason::NoMatchingRules, transactions.len()));
        }

        let summary = RunSummary {
            total_transactions: transactions.len(),
            rules_generated: outcome.rules.len(),
            recommendations_returned: recommendations.len(),
        };
        info!(
            event_name = "recommend.request.mined",
            basket_size = basket.len(),
            transactions = summary.total_transactions,
            rules = summary.rules_generated,
            returned = summary.recommendations_returned,
            "served mined recommendations"
        );

        Ok(RecommendationOutcome::Mined { recommendations, summary })
    }

    /// Run a full mining pass and report counts only.
    pub fn train(&self, transactions: &[Transaction]) -> MiningResult<TrainingSummary> {
        let outcome = self.miner.mine(transactions)?;
        Ok(TrainingSummary::from(&outcome.stats))
    }

    /// Strongest multi-item combinations and rules in the history.
    pub fn stats(&self, transactions: &[Transaction]) -> MiningResult<RecommendationStats> {
        let outcome = self.miner.mine(transactions)?;

        let mut top_combinations: Vec<Itemset> =
            outcome.frequent_itemsets.iter().filter(|itemset| itemset.len() >= 2).cloned().collect();
        top_combinations.sort_by(|a, b| b.support.total_cmp(&a.support));
        top_combinations.truncate(STATS_TOP_N);

        Ok(RecommendationStats {
            total_transactions: outcome.stats.total_transactions,
            frequent_itemsets_count: outcome.stats.frequent_itemsets,
            rules_count: outcome.stats.rules,
            top_combinations,
            top_rules: outcome.rules.iter().take(STATS_TOP_N).cloned().collect(),
        })
    }

    fn fallback<C>(
        &self,
        catalog: &C,
        reason: FallbackReason,
        transactions: usize,
    ) -> RecommendationOutcome
    where
        C: PopularitySource + ?Sized,
    {
        let items = catalog.popular_items(self.settings.fallback_limit);
        info!(
            event_name = "recommend.request.fallback",
            reason = ?reason,
            transactions,
            returned = items.len(),
            "served popularity fallback"
        );
        RecommendationOutcome::Fallback { items, reason }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
