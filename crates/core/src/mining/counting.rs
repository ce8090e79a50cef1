//! Support counting strategies

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;
use crate::transactions::Transaction;

/// Counts, for every candidate, how many transactions contain all its items.
///
/// Implementations must return one count per candidate, in candidate order,
/// and must agree exactly with a plain scan.
pub trait SupportCounter: fmt::Debug + Send + Sync {
    fn count(&self, candidates: &[Vec<ItemId>], transactions: &[Transaction]) -> Vec<usize>;
}

/// Rescans every transaction for every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanCounter;

impl SupportCounter for ScanCounter {
    fn count(&self, candidates: &[Vec<ItemId>], transactions: &[Transaction]) -> Vec<usize> {
        candidates
            .iter()
            .map(|candidate| {
                transactions.iter().filter(|transaction| transaction.contains_all(candidate)).count()
            })
            .collect()
    }
}

/// Intersects per-item transaction-id lists.
///
/// The id lists are built once per call, so this pays off when a level has
/// many candidates over a long history.
#[derive(Debug, Clone, Copy, Default)]
pub struct TidSetCounter;

impl SupportCounter for TidSetCounter {
    fn count(&self, candidates: &[Vec<ItemId>], transactions: &[Transaction]) -> Vec<usize> {
        let mut tid_lists: HashMap<&ItemId, Vec<usize>> = HashMap::new();
        for (tid, transaction) in transactions.iter().enumerate() {
            for item in transaction.items() {
                tid_lists.entry(item).or_default().push(tid);
            }
        }

        candidates
            .iter()
            .map(|candidate| {
                let mut items = candidate.iter();
                let Some(first) = items.next() else {
                    return transactions.len();
                };
                let Some(seed) = tid_lists.get(first) else {
                    return 0;
                };

                let mut shared = seed.clone();
                for item in items {
                    match tid_lists.get(item) {
                        Some(tids) => shared = intersect_sorted(&shared, tids),
                        None => return 0,
                    }
                    if shared.is_empty() {
                        break;
                    }
                }
                shared.len()
            })
            .collect()
    }
}

fn intersect_sorted(left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Configurable choice of [`SupportCounter`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingStrategy {
    #[default]
    Scan,
    #[serde(rename = "tidset")]
    TidSet,
}

impl CountingStrategy {
    pub fn counter(&self) -> Box<dyn SupportCounter> {
        match self {
            Self::Scan => Box::new(ScanCounter),
            Self::TidSet => Box::new(TidSetCounter),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::TidSet => "tidset",
        }
    }
}

impl std::str::FromStr for CountingStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scan" => Ok(Self::Scan),
            "tidset" | "tid_set" => Ok(Self::TidSet),
            other => Err(format!("unsupported counting strategy `{other}` (expected scan|tidset)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<ItemId> {
        values.iter().map(|value| ItemId::from(*value)).collect()
    }

    fn transactions() -> Vec<Transaction> {
        vec![
            Transaction::new(["a", "b", "c"]),
            Transaction::new(["a", "b"]),
            Transaction::new(["b", "c"]),
            Transaction::new(["a", "c", "d"]),
        ]
    }

    #[test]
    fn scan_counts_each_candidate() {
        let candidates = vec![ids(&["a", "b"]), ids(&["b", "c"]), ids(&["a", "b", "c"]), ids(&["z"])];
        assert_eq!(ScanCounter.count(&candidates, &transactions()), vec![2, 2, 1, 0]);
    }

    #[test]
    fn tidset_matches_scan() {
        let candidates = vec![
            ids(&["a"]),
            ids(&["a", "c"]),
            ids(&["c", "d"]),
            ids(&["a", "b", "c"]),
            ids(&["b", "d"]),
            ids(&["q", "a"]),
        ];
        let transactions = transactions();

        assert_eq!(
            TidSetCounter.count(&candidates, &transactions),
            ScanCounter.count(&candidates, &transactions)
        );
    }

    #[test]
    fn strategy_parses_config_values() {
        assert_eq!("scan".parse::<CountingStrategy>(), Ok(CountingStrategy::Scan));
        assert_eq!("TidSet".parse::<CountingStrategy>(), Ok(CountingStrategy::TidSet));
        assert!("hash_tree".parse::<CountingStrategy>().is_err());
    }
}
