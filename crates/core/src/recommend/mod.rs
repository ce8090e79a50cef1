//! Basket recommendations from mined association rules.
//!
//! [`recommend`] ranks candidate items for a basket from a rule set.
//! [`enrich`] recomputes the reported metrics for the concrete basket and
//! resolves identifiers against an [`ItemCatalog`]. [`RecommendationEngine`]
//! ties mining, scoring, enrichment and the popularity fallback together.

mod catalog;
mod enrich;
mod engine;
mod fallback;
mod scorer;
mod types;

pub use catalog::{Catalog, ItemCatalog};
pub use engine::{EngineSettings, RecommendationEngine, STATS_TOP_N};
pub use enrich::{enrich, joint_support};
pub use fallback::{popularity_ranking, PopularitySource};
pub use scorer::recommend;
pub use types::*;

/// Default number of mined recommendations returned
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// Default number of popularity-ranked items returned on fallback
pub const DEFAULT_FALLBACK_LIMIT: usize = 10;

/// Below this many transactions the popularity ranking is served
pub const MIN_HISTORY_TRANSACTIONS: usize = 3;
