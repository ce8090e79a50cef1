//! Frequent itemset mining and association rule generation.
//!
//! Mining is exact, in-memory and recomputed from scratch on every call:
//!
//! 1. Count every distinct item and keep those with support >= `min_support`
//! 2. Join surviving (k-1)-itemsets pairwise into k-item candidates
//! 3. Count candidate support and keep the frequent ones
//! 4. Repeat until a level comes back empty
//! 5. Split every frequent itemset of size >= 2 into antecedent/consequent
//!    rules and keep those with confidence >= `min_confidence`
//!
//! Support counting sits behind [`SupportCounter`] so the brute-force scan can
//! be swapped for transaction-id intersection without changing any output.

mod apriori;
mod counting;
mod rules;
mod support;
mod types;

pub use apriori::{join_candidates, mine, Miner};
pub use counting::{CountingStrategy, ScanCounter, SupportCounter, TidSetCounter};
pub use rules::{generate_rules, generate_subsets};
pub use support::support;
pub(crate) use support::ratio;
pub use types::*;

use crate::errors::DomainError;

/// Result type for mining operations
pub type MiningResult<T> = Result<T, DomainError>;

/// Default minimum support (5% of transactions)
pub const DEFAULT_MIN_SUPPORT: f64 = 0.05;

/// Default minimum confidence
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

/// Support substituted for a consequent that was never frequent on its own,
/// so lift stays finite.
pub const LIFT_SMOOTHING_FLOOR: f64 = 0.01;
