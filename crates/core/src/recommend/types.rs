//! Types for the recommendation scorer

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::item::{Item, ItemId};
use crate::mining::{Itemset, MiningStats, Rule};

/// Items in the in-progress selection being scored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket(BTreeSet<ItemId>);

impl Basket {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self(items.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.0.contains(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ItemId> for Basket {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A scored candidate produced by firing rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Item being recommended
    pub item_id: ItemId,
    /// Best score among the rules proposing this item
    pub score: f64,
    /// Confidence of the winning rule
    pub confidence: f64,
    /// Itemset support of the winning rule
    pub support: f64,
    /// Basket items that triggered the winning rule
    pub based_on: Vec<ItemId>,
}

/// Compact view of the rule behind an enriched recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub antecedent: Vec<ItemId>,
    pub consequent: Vec<ItemId>,
    pub confidence: f64,
    pub support: f64,
}

impl From<&Rule> for RuleSummary {
    fn from(rule: &Rule) -> Self {
        Self {
            antecedent: rule.antecedent.clone(),
            consequent: rule.consequent.clone(),
            confidence: rule.confidence,
            support: rule.support,
        }
    }
}

/// A recommendation with metrics recomputed for the actual basket and
/// identifiers resolved to catalog records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecommendation {
    pub item: Item,
    /// Score assigned by the scorer
    pub score: f64,
    /// Confidence of the rule matching this basket
    pub confidence: f64,
    /// Joint frequency of the item with any triggering basket item
    pub support: f64,
    pub based_on: Vec<ItemId>,
    pub based_on_names: Vec<String>,
    pub confidence_percent: u32,
    pub support_percent: u32,
    pub matching_rule: Option<RuleSummary>,
}

/// Why the popularity ranking was served instead of mined results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Fewer transactions than the configured minimum
    InsufficientHistory,
    /// No rule fired for the basket
    NoMatchingRules,
}

impl FallbackReason {
    pub fn message(&self) -> &'static str {
        match self {
            FallbackReason::InsufficientHistory => {
                "Showing popular items (insufficient order history)"
            }
            FallbackReason::NoMatchingRules => "Showing popular items (no related purchases found)",
        }
    }
}

/// Counts describing one recommendation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_transactions: usize,
    pub rules_generated: usize,
    pub recommendations_returned: usize,
}

/// Result of a recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    Mined { recommendations: Vec<EnrichedRecommendation>, summary: RunSummary },
    /// Popularity-ranked items; carry no confidence or support
    Fallback { items: Vec<Item>, reason: FallbackReason },
}

impl RecommendationOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, RecommendationOutcome::Fallback { .. })
    }
}

/// Counts from a training run; nothing is retained afterwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub total_transactions: usize,
    pub frequent_itemsets_count: usize,
    pub rules_count: usize,
    pub levels: usize,
}

impl From<&MiningStats> for TrainingSummary {
    fn from(stats: &MiningStats) -> Self {
        Self {
            total_transactions: stats.total_transactions,
            frequent_itemsets_count: stats.frequent_itemsets,
            rules_count: stats.rules,
            levels: stats.levels,
        }
    }
}

/// Summary of the strongest patterns in the history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationStats {
    pub total_transactions: usize,
    pub frequent_itemsets_count: usize,
    pub rules_count: usize,
    /// Multi-item itemsets by descending support
    pub top_combinations: Vec<Itemset>,
    /// Highest-confidence rules
    pub top_rules: Vec<Rule>,
}
