use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use super::types::{Basket, Recommendation};
use crate::domain::item::ItemId;
use crate::mining::Rule;

/// Rank items for `basket` from mined `rules`.
///
/// A rule fires when its antecedent shares at least one item with the basket.
/// Each consequent item not already in the basket is proposed with the rule's
/// score. When several rules propose the same item, an entry is only replaced
/// by a strictly higher score. Results are sorted by descending score (ties in
/// first-proposed order) and cut to `limit`.
pub fn recommend(basket: &Basket, rules: &[Rule], limit: usize) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = Vec::new();
    let mut positions: HashMap<ItemId, usize> = HashMap::new();

    for rule in rules {
        let based_on: Vec<ItemId> =
            rule.antecedent.iter().filter(|item| basket.contains(item)).cloned().collect();
        if based_on.is_empty() {
            continue;
        }

        let score = rule.score();
        for item in rule.consequent.iter().filter(|item| !basket.contains(item)) {
            let candidate = Recommendation {
                item_id: item.clone(),
                score,
                confidence: rule.confidence,
                support: rule.support,
                based_on: based_on.clone(),
            };

            match positions.get(item) {
                Some(&position) => {
                    if score > ranked[position].score {
                        ranked[position] = candidate;
                    }
                }
                None => {
                    positions.insert(item.clone(), ranked.len());
                    ranked.push(candidate);
                }
            }
        }
    }

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);

    debug!(
        event_name = "recommend.scored",
        basket_size = basket.len(),
        rules = rules.len(),
        returned = ranked.len(),
        "basket scored against rules"
    );

    ranked
}
