use tracing::debug;

use super::catalog::ItemCatalog;
use super::types::{Basket, EnrichedRecommendation, Recommendation, RuleSummary};
use crate::domain::item::ItemId;
use crate::mining::{ratio, Rule};
use crate::transactions::Transaction;

/// Recompute metrics for the actual basket and resolve identifiers to names.
///
/// The scorer's numbers describe whichever rule fired; a rule may overlap the
/// basket only partially. Here confidence comes from the first rule whose
/// consequent holds the target and whose antecedent meets the basket, and
/// support is the share of transactions holding the target together with at
/// least one triggering basket item. Targets missing from the catalog are
/// dropped.
pub fn enrich<C>(
    recommendations: &[Recommendation],
    rules: &[Rule],
    transactions: &[Transaction],
    basket: &Basket,
    catalog: &C,
) -> Vec<EnrichedRecommendation>
where
    C: ItemCatalog + ?Sized,
{
    let mut enriched = Vec::with_capacity(recommendations.len());

    for recommendation in recommendations {
        let Some(item) = catalog.item(&recommendation.item_id) else {
            debug!(
                event_name = "recommend.enrich.unknown_item",
                item_id = %recommendation.item_id,
                "dropping recommendation missing from catalog"
            );
            continue;
        };

        let matching_rule = rules.iter().find(|rule| {
            rule.consequent.contains(&recommendation.item_id)
                && rule.antecedent.iter().any(|trigger| basket.contains(trigger))
        });
        let confidence = matching_rule.map_or(recommendation.score, |rule| rule.confidence);

        let support = if recommendation.based_on.is_empty() {
            recommendation.support
        } else {
            joint_support(&recommendation.item_id, &recommendation.based_on, transactions)
        };

        let based_on_names = recommendation
            .based_on
            .iter()
            .filter_map(|id| catalog.item(id).map(|based_on| based_on.name.clone()))
            .collect();

        enriched.push(EnrichedRecommendation {
            item: item.clone(),
            score: recommendation.score,
            confidence,
            support,
            based_on: recommendation.based_on.clone(),
            based_on_names,
            confidence_percent: as_percent(confidence),
            support_percent: as_percent(support),
            matching_rule: matching_rule.map(RuleSummary::from),
        });
    }

    enriched
}

/// Share of transactions containing `target` and any of `triggers`.
pub fn joint_support(target: &ItemId, triggers: &[ItemId], transactions: &[Transaction]) -> f64 {
    let count = transactions
        .iter()
        .filter(|transaction| transaction.contains(target) && transaction.intersects(triggers))
        .count();
    ratio(count, transactions.len())
}

fn as_percent(value: f64) -> u32 {
    (value * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::item::Item;
    use crate::recommend::catalog::Catalog;

    fn ids(values: &[&str]) -> Vec<ItemId> {
        values.iter().map(|value| ItemId::from(*value)).collect()
    }

    fn catalog() -> Catalog {
        Catalog::new(["A", "B", "C", "X"].into_iter().map(|id| Item {
            id: ItemId::from(id),
            name: format!("Item {id}"),
            price: Decimal::new(300, 2),
            hearts: 1,
            rating: 4.5,
            available: true,
        }))
    }

    fn history() -> Vec<Transaction> {
        vec![
            Transaction::new(["A", "X"]),
            Transaction::new(["B", "X"]),
            Transaction::new(["A", "B"]),
            Transaction::new(["C", "X"]),
            Transaction::new(["A", "B", "X"]),
        ]
    }

    fn recommendation(item: &str, based_on: &[&str], score: f64) -> Recommendation {
        Recommendation {
            item_id: ItemId::from(item),
            score,
            confidence: score,
            support: 0.2,
            based_on: ids(based_on),
        }
    }

    #[test]
    fn support_is_recomputed_for_triggering_items() {
        let recommendations = vec![recommendation("X", &["A", "B"], 0.7)];

        let enriched = enrich(&recommendations, &[], &history(), &Basket::new(["A", "B"]), &catalog());

        // X co-occurs with A or B in three of five transactions.
        assert!((enriched[0].support - 0.6).abs() < 1e-9);
        assert_eq!(enriched[0].support_percent, 60);
        assert_eq!(enriched[0].based_on_names, vec!["Item A", "Item B"]);
    }

    #[test]
    fn confidence_comes_from_rule_matching_the_basket() {
        let rules = vec![
            Rule {
                antecedent: ids(&["C"]),
                consequent: ids(&["X"]),
                support: 0.2,
                confidence: 0.99,
                lift: 1.0,
            },
            Rule {
                antecedent: ids(&["B", "Q"]),
                consequent: ids(&["X"]),
                support: 0.4,
                confidence: 0.66,
                lift: 1.0,
            },
        ];
        let recommendations = vec![recommendation("X", &["A"], 0.7)];

        let enriched = enrich(&recommendations, &rules, &history(), &Basket::new(["A", "B"]), &catalog());

        assert_eq!(enriched[0].confidence, 0.66);
        assert_eq!(enriched[0].confidence_percent, 66);
        let matching = enriched[0].matching_rule.as_ref().expect("matching rule");
        assert_eq!(matching.antecedent, ids(&["B", "Q"]));
        assert_eq!(enriched[0].score, 0.7);
    }

    #[test]
    fn confidence_falls_back_to_score_without_matching_rule() {
        let recommendations = vec![recommendation("X", &["A"], 0.7)];

        let enriched = enrich(&recommendations, &[], &history(), &Basket::new(["A"]), &catalog());

        assert_eq!(enriched[0].confidence, 0.7);
        assert!(enriched[0].matching_rule.is_none());
    }

    #[test]
    fn unknown_targets_are_dropped() {
        let recommendations =
            vec![recommendation("ghost", &["A"], 0.9), recommendation("X", &["A"], 0.8)];

        let enriched = enrich(&recommendations, &[], &history(), &Basket::new(["A"]), &catalog());

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].item.id, ItemId::from("X"));
    }

    #[test]
    fn empty_history_yields_zero_support() {
        assert_eq!(joint_support(&ItemId::from("X"), &ids(&["A"]), &[]), 0.0);
    }

    #[test]
    fn empty_triggers_keep_rule_support() {
        let recommendations = vec![recommendation("X", &[], 0.7)];

        let enriched = enrich(&recommendations, &[], &history(), &Basket::new(["A"]), &catalog());

        assert_eq!(enriched[0].support, 0.2);
    }
}
