pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod mining;
pub mod recommend;
pub mod transactions;

pub use cache::{CacheKey, CachedMiner, InMemoryMiningCache, MiningCache, NoopMiningCache};
pub use domain::item::{Item, ItemId};
pub use domain::order::{Order, OrderId, OrderLine, OrderStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use mining::{
    CountingStrategy, Itemset, Miner, MiningOutcome, MiningParams, MiningStats, Rule,
    SupportCounter,
};
pub use recommend::{
    Basket, Catalog, EngineSettings, EnrichedRecommendation, FallbackReason, ItemCatalog,
    PopularitySource, Recommendation, RecommendationEngine, RecommendationOutcome,
    RecommendationStats, TrainingSummary,
};
pub use transactions::{build_transactions, ItemResolver, Transaction};
