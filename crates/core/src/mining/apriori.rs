//! Level-wise Apriori search

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use super::counting::{CountingStrategy, ScanCounter, SupportCounter};
use super::rules::generate_rules;
use super::support::ratio;
use super::types::{Itemset, MiningOutcome, MiningParams, MiningStats};
use super::MiningResult;
use crate::domain::item::ItemId;
use crate::errors::DomainError;
use crate::transactions::Transaction;

/// Apriori miner.
///
/// Holds only configuration; every call to [`Miner::mine`] starts from
/// scratch and keeps no state between calls.
#[derive(Debug)]
pub struct Miner {
    params: MiningParams,
    counter: Box<dyn SupportCounter>,
}

impl Miner {
    /// Create a miner that counts support by scanning
    pub fn new(params: MiningParams) -> Self {
        Self { params, counter: Box::new(ScanCounter) }
    }

    /// Replace the support counting strategy
    pub fn with_counter(mut self, counter: impl SupportCounter + 'static) -> Self {
        self.counter = Box::new(counter);
        self
    }

    pub fn with_strategy(mut self, strategy: CountingStrategy) -> Self {
        self.counter = strategy.counter();
        self
    }

    pub fn params(&self) -> &MiningParams {
        &self.params
    }

    /// Mine frequent itemsets and rules from `transactions`.
    ///
    /// Parameters are validated before any work. Empty transactions are
    /// skipped and do not count towards the total. An empty transaction set is
    /// not an error and yields an empty outcome.
    pub fn mine(&self, transactions: &[Transaction]) -> MiningResult<MiningOutcome> {
        self.params.validate()?;
        let transactions = non_empty(transactions);
        let transactions: &[Transaction] = &transactions;

        info!(
            event_name = "mining.run.start",
            transactions = transactions.len(),
            min_support = self.params.min_support,
            min_confidence = self.params.min_confidence,
            "starting apriori run"
        );

        if transactions.is_empty() {
            return Ok(MiningOutcome::default());
        }

        let (frequent_itemsets, levels) = self.frequent_itemsets(transactions)?;
        let rules = generate_rules(&frequent_itemsets, self.params.min_confidence);

        let stats = MiningStats {
            total_transactions: transactions.len(),
            frequent_itemsets: frequent_itemsets.len(),
            rules: rules.len(),
            levels,
        };

        info!(
            event_name = "mining.run.complete",
            transactions = stats.total_transactions,
            frequent_itemsets = stats.frequent_itemsets,
            rules = stats.rules,
            levels = stats.levels,
            "apriori run complete"
        );

        Ok(MiningOutcome { frequent_itemsets, rules, stats })
    }

    fn frequent_itemsets(&self, transactions: &[Transaction]) -> MiningResult<(Vec<Itemset>, usize)> {
        let total = transactions.len();
        let mut current = self.frequent_singletons(transactions);
        let mut all = current.clone();
        let mut levels = usize::from(!current.is_empty());
        let mut k = 2;

        while !current.is_empty() {
            if self.params.max_itemset_size.is_some_and(|max| k > max) {
                debug!(event_name = "mining.level.capped", level = k, "itemset size ceiling reached");
                break;
            }

            let candidates = join_candidates(&current);
            if let Some(limit) = self.params.max_candidates {
                if candidates.len() > limit {
                    return Err(DomainError::CandidateLimitExceeded {
                        level: k,
                        candidates: candidates.len(),
                        limit,
                    });
                }
            }

            let counts = self.counter.count(&candidates, transactions);
            let candidate_count = candidates.len();
            current = candidates
                .into_iter()
                .zip(counts)
                .filter_map(|(items, count)| {
                    let support = ratio(count, total);
                    (support >= self.params.min_support)
                        .then_some(Itemset { items, count, support })
                })
                .collect();

            debug!(
                event_name = "mining.level.complete",
                level = k,
                candidates = candidate_count,
                frequent = current.len(),
                "apriori level evaluated"
            );

            if !current.is_empty() {
                levels += 1;
                all.extend(current.iter().cloned());
            }
            k += 1;
        }

        Ok((all, levels))
    }

    fn frequent_singletons(&self, transactions: &[Transaction]) -> Vec<Itemset> {
        let mut counts: HashMap<&ItemId, usize> = HashMap::new();
        for transaction in transactions {
            for item in transaction.items() {
                *counts.entry(item).or_insert(0) += 1;
            }
        }

        let mut singletons: Vec<Itemset> = counts
            .into_iter()
            .filter_map(|(item, count)| {
                let support = ratio(count, transactions.len());
                (support >= self.params.min_support)
                    .then(|| Itemset { items: vec![item.clone()], count, support })
            })
            .collect();
        singletons.sort_by(|a, b| a.items.cmp(&b.items));
        singletons
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(MiningParams::default())
    }
}

fn non_empty(transactions: &[Transaction]) -> Cow<'_, [Transaction]> {
    if transactions.iter().any(Transaction::is_empty) {
        Cow::Owned(
            transactions.iter().filter(|transaction| !transaction.is_empty()).cloned().collect(),
        )
    } else {
        Cow::Borrowed(transactions)
    }
}

/// Join step: every unordered pair from `previous` whose union is exactly one
/// item larger, deduplicated as sorted sequences in first-seen order.
pub fn join_candidates(previous: &[Itemset]) -> Vec<Vec<ItemId>> {
    let mut seen: HashSet<Vec<ItemId>> = HashSet::new();
    let mut candidates = Vec::new();

    for (index, left) in previous.iter().enumerate() {
        for right in &previous[index + 1..] {
            let union: BTreeSet<&ItemId> = left.items.iter().chain(right.items.iter()).collect();
            if union.len() != left.len() + 1 {
                continue;
            }

            let candidate: Vec<ItemId> = union.into_iter().cloned().collect();
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// Mine with explicit thresholds and the default counting strategy.
pub fn mine(
    transactions: &[Transaction],
    min_support: f64,
    min_confidence: f64,
) -> MiningResult<MiningOutcome> {
    Miner::new(MiningParams::new(min_support, min_confidence)).mine(transactions)
}
