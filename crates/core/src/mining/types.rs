//! Types for the itemset miner

use serde::{Deserialize, Serialize};

use super::{MiningResult, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_SUPPORT};
use crate::domain::item::ItemId;
use crate::errors::DomainError;

/// A frequent item combination with its support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    /// Distinct items, sorted ascending
    pub items: Vec<ItemId>,
    /// Number of transactions containing all items
    pub count: usize,
    /// Fraction of transactions containing all items (0.0 - 1.0)
    pub support: f64,
}

impl Itemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.binary_search(item).is_ok()
    }
}

/// Association rule: antecedent => consequent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Left-hand side, a non-empty proper subset of the generating itemset
    pub antecedent: Vec<ItemId>,
    /// Right-hand side, the rest of the generating itemset
    pub consequent: Vec<ItemId>,
    /// Support of the generating itemset
    pub support: f64,
    /// count(itemset) / count(antecedent)
    pub confidence: f64,
    /// confidence / support(consequent)
    pub lift: f64,
}

impl Rule {
    /// Ranking score: confidence, or support when confidence is zero.
    pub fn score(&self) -> f64 {
        if self.confidence > 0.0 {
            self.confidence
        } else {
            self.support
        }
    }
}

/// Thresholds and safety ceilings for a mining run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    /// Minimum support, in (0, 1]
    pub min_support: f64,
    /// Minimum confidence, in (0, 1]
    pub min_confidence: f64,
    /// Largest itemset size to search; unbounded when `None`
    pub max_itemset_size: Option<usize>,
    /// Largest candidate count accepted for a single level; unbounded when `None`
    pub max_candidates: Option<usize>,
}

impl MiningParams {
    pub fn new(min_support: f64, min_confidence: f64) -> Self {
        Self { min_support, min_confidence, ..Self::default() }
    }

    pub fn with_max_itemset_size(mut self, max: usize) -> Self {
        self.max_itemset_size = Some(max);
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = Some(max);
        self
    }

    /// Rejects thresholds outside (0, 1], NaN included.
    pub fn validate(&self) -> MiningResult<()> {
        validate_threshold("min_support", self.min_support)?;
        validate_threshold("min_confidence", self.min_confidence)?;
        if self.max_itemset_size == Some(0) {
            return Err(DomainError::InvariantViolation(
                "max_itemset_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_itemset_size: None,
            max_candidates: None,
        }
    }
}

fn validate_threshold(name: &'static str, value: f64) -> MiningResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidThreshold { name, value })
    }
}

/// Counts describing a mining run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningStats {
    pub total_transactions: usize,
    pub frequent_itemsets: usize,
    pub rules: usize,
    /// Number of non-empty levels found
    pub levels: usize,
}

/// Everything a mining run produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningOutcome {
    /// All frequent itemsets, level by level
    pub frequent_itemsets: Vec<Itemset>,
    /// Rules sorted by descending confidence
    pub rules: Vec<Rule>,
    pub stats: MiningStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_documented_thresholds() {
        let params = MiningParams::default();
        assert_eq!(params.min_support, 0.05);
        assert_eq!(params.min_confidence, 0.6);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn thresholds_outside_unit_interval_are_rejected() {
        for (support, confidence, name) in [
            (0.0, 0.5, "min_support"),
            (1.2, 0.5, "min_support"),
            (f64::NAN, 0.5, "min_support"),
            (0.5, 0.0, "min_confidence"),
            (0.5, -0.1, "min_confidence"),
        ] {
            let error = MiningParams::new(support, confidence).validate().unwrap_err();
            assert!(matches!(error, DomainError::InvalidThreshold { name: n, .. } if n == name));
        }

        assert!(MiningParams::new(1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn zero_itemset_size_is_rejected() {
        let error = MiningParams::default().with_max_itemset_size(0).validate().unwrap_err();
        assert!(matches!(error, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn rule_score_falls_back_to_support() {
        let rule = Rule {
            antecedent: vec![ItemId::from("a")],
            consequent: vec![ItemId::from("b")],
            support: 0.3,
            confidence: 0.0,
            lift: 0.0,
        };
        assert_eq!(rule.score(), 0.3);

        let rule = Rule { confidence: 0.8, ..rule };
        assert_eq!(rule.score(), 0.8);
    }
}
