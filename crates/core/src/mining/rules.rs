use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::{Itemset, Rule};
use super::LIFT_SMOOTHING_FLOOR;
use crate::domain::item::ItemId;

/// All 2^n subsets of `items`, built by doubling: start from the empty set and
/// extend every existing subset with each item in turn.
///
/// Subsets of a sorted slice come out sorted.
pub fn generate_subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut subsets: Vec<Vec<T>> = Vec::with_capacity(1 << items.len().min(16));
    subsets.push(Vec::new());

    for item in items {
        let existing = subsets.len();
        for index in 0..existing {
            let mut extended = subsets[index].clone();
            extended.push(item.clone());
            subsets.push(extended);
        }
    }

    subsets
}

/// Derive rules from frequent itemsets.
///
/// Antecedent and consequent supports are looked up among `frequent_itemsets`;
/// an antecedent that was never frequent yields no rule, a consequent that was
/// never frequent is given [`LIFT_SMOOTHING_FLOOR`] support for the lift.
/// Confidence is a ratio of transaction counts, so a rule exactly at
/// `min_confidence` is kept.
/// Output is stably sorted by descending confidence.
pub fn generate_rules(frequent_itemsets: &[Itemset], min_confidence: f64) -> Vec<Rule> {
    let by_items: HashMap<&[ItemId], &Itemset> =
        frequent_itemsets.iter().map(|itemset| (itemset.items.as_slice(), itemset)).collect();

    let mut rules = Vec::new();

    for itemset in frequent_itemsets.iter().filter(|itemset| itemset.len() >= 2) {
        for antecedent in generate_subsets(&itemset.items) {
            if antecedent.is_empty() || antecedent.len() == itemset.len() {
                continue;
            }

            let antecedent_count = match by_items.get(antecedent.as_slice()) {
                Some(found) if found.count > 0 => found.count,
                _ => continue,
            };

            let confidence = itemset.count as f64 / antecedent_count as f64;
            if confidence < min_confidence {
                continue;
            }

            let consequent: Vec<ItemId> =
                itemset.items.iter().filter(|item| !antecedent.contains(item)).cloned().collect();
            let consequent_support = by_items
                .get(consequent.as_slice())
                .map(|found| found.support)
                .unwrap_or(LIFT_SMOOTHING_FLOOR);

            rules.push(Rule {
                antecedent,
                consequent,
                support: itemset.support,
                confidence,
                lift: confidence / consequent_support,
            });
        }
    }

    rules.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Itemset over a history of ten transactions.
    fn itemset(items: &[&str], count: usize) -> Itemset {
        Itemset {
            items: items.iter().map(|item| ItemId::from(*item)).collect(),
            count,
            support: count as f64 / 10.0,
        }
    }

    #[test]
    fn subsets_double_per_item() {
        let subsets = generate_subsets(&["a", "b", "c"]);

        assert_eq!(subsets.len(), 8);
        assert_eq!(subsets[0], Vec::<&str>::new());
        assert_eq!(subsets[1], vec!["a"]);
        assert_eq!(subsets[3], vec!["a", "b"]);
        assert_eq!(subsets[7], vec!["a", "b", "c"]);
        assert_eq!(generate_subsets::<u8>(&[]), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn pair_yields_rules_in_both_directions() {
        let frequent =
            vec![itemset(&["a"], 8), itemset(&["b"], 6), itemset(&["a", "b"], 6)];

        let rules = generate_rules(&frequent, 0.5);

        assert_eq!(rules.len(), 2);
        // b -> a: 0.6 / 0.6
        assert_eq!(rules[0].antecedent, vec![ItemId::from("b")]);
        assert!((rules[0].confidence - 1.0).abs() < 1e-9);
        assert!((rules[0].lift - 1.0 / 0.8).abs() < 1e-9);
        // a -> b: 0.6 / 0.8
        assert_eq!(rules[1].antecedent, vec![ItemId::from("a")]);
        assert!((rules[1].confidence - 0.75).abs() < 1e-9);
        assert!((rules[1].lift - 0.75 / 0.6).abs() < 1e-9);
    }

    #[test]
    fn low_confidence_rules_are_dropped() {
        let frequent =
            vec![itemset(&["a"], 8), itemset(&["b"], 6), itemset(&["a", "b"], 6)];

        let rules = generate_rules(&frequent, 0.9);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].consequent, vec![ItemId::from("a")]);
    }

    #[test]
    fn missing_antecedent_support_skips_the_rule() {
        // "b" alone was never recorded as frequent.
        let frequent = vec![itemset(&["a"], 5), itemset(&["a", "b"], 4)];

        let rules = generate_rules(&frequent, 0.1);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, vec![ItemId::from("a")]);
    }

    #[test]
    fn missing_consequent_support_uses_smoothing_floor() {
        let frequent = vec![itemset(&["a"], 5), itemset(&["a", "b"], 4)];

        let rules = generate_rules(&frequent, 0.1);

        assert!((rules[0].confidence - 0.8).abs() < 1e-9);
        assert!((rules[0].lift - 0.8 / LIFT_SMOOTHING_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn triple_partitions_cover_every_split() {
        let frequent = vec![
            itemset(&["a"], 5),
            itemset(&["b"], 5),
            itemset(&["c"], 5),
            itemset(&["a", "b"], 5),
            itemset(&["a", "c"], 5),
            itemset(&["b", "c"], 5),
            itemset(&["a", "b", "c"], 5),
        ];

        let rules = generate_rules(&frequent, 0.5);
        let from_triple: Vec<&Rule> =
            rules.iter().filter(|rule| rule.antecedent.len() + rule.consequent.len() == 3).collect();

        assert_eq!(from_triple.len(), 6);
        for rule in from_triple {
            let mut union = rule.antecedent.clone();
            union.extend(rule.consequent.iter().cloned());
            union.sort();
            assert_eq!(union, vec![ItemId::from("a"), ItemId::from("b"), ItemId::from("c")]);
            assert!(rule.antecedent.iter().all(|item| !rule.consequent.contains(item)));
        }
    }

    #[test]
    fn rule_on_the_confidence_threshold_is_kept() {
        // Five transactions: {A,B} x2, {A,C}, {B,C}, {A,B,C}. A -> B is 3/4.
        let frequent = vec![
            Itemset { items: vec![ItemId::from("A")], count: 4, support: 0.8 },
            Itemset { items: vec![ItemId::from("B")], count: 4, support: 0.8 },
            Itemset { items: vec![ItemId::from("A"), ItemId::from("B")], count: 3, support: 0.6 },
        ];

        let rules = generate_rules(&frequent, 0.75);

        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|rule| rule.confidence == 0.75));
    }
}
