//! Optional memoization of mining results.
//!
//! The miner itself never caches. [`CachedMiner`] sits in front of it and
//! keys results by a digest of the transaction set and the thresholds, so a
//! repeated request over unchanged history skips the search. Callers are
//! responsible for calling [`MiningCache::invalidate_all`] when new
//! transactions are recorded.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::mining::{Miner, MiningOutcome, MiningParams, MiningResult};
use crate::transactions::Transaction;

pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Digest of a transaction set and mining thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Hash `transactions` independent of their order, together with the
    /// parameters that change mining output.
    pub fn compute(transactions: &[Transaction], params: &MiningParams) -> Self {
        let mut digests: Vec<[u8; 32]> = transactions
            .iter()
            .map(|transaction| {
                let mut hasher = blake3::Hasher::new();
                for item in transaction.items() {
                    hasher.update(item.as_str().as_bytes());
                    hasher.update(&[0]);
                }
                *hasher.finalize().as_bytes()
            })
            .collect();
        digests.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&(digests.len() as u64).to_le_bytes());
        for digest in &digests {
            hasher.update(digest);
        }
        hasher.update(&params.min_support.to_bits().to_le_bytes());
        hasher.update(&params.min_confidence.to_bits().to_le_bytes());
        hasher.update(&encode_limit(params.max_itemset_size));
        hasher.update(&encode_limit(params.max_candidates));

        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

fn encode_limit(limit: Option<usize>) -> [u8; 9] {
    let mut bytes = [0u8; 9];
    if let Some(value) = limit {
        bytes[0] = 1;
        bytes[1..].copy_from_slice(&(value as u64).to_le_bytes());
    }
    bytes
}

/// Storage for memoized mining outcomes
pub trait MiningCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Arc<MiningOutcome>>;
    fn insert(&self, key: CacheKey, outcome: Arc<MiningOutcome>);
    fn invalidate_all(&self);
}

/// Cache that never stores anything; every call recomputes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiningCache;

impl MiningCache for NoopMiningCache {
    fn get(&self, _key: &CacheKey) -> Option<Arc<MiningOutcome>> {
        None
    }

    fn insert(&self, _key: CacheKey, _outcome: Arc<MiningOutcome>) {}

    fn invalidate_all(&self) {}
}

#[derive(Debug, Default)]
struct CacheEntries {
    outcomes: HashMap<CacheKey, Arc<MiningOutcome>>,
    insertion_order: VecDeque<CacheKey>,
}

/// Bounded in-process cache; evicts the oldest entry when full
#[derive(Debug)]
pub struct InMemoryMiningCache {
    capacity: usize,
    entries: Mutex<CacheEntries>,
}

impl InMemoryMiningCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: Mutex::new(CacheEntries::default()) }
    }

    pub fn len(&self) -> usize {
        self.lock().outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheEntries> {
        // Entries stay consistent even if a holder panicked mid-read.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryMiningCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl MiningCache for InMemoryMiningCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<MiningOutcome>> {
        self.lock().outcomes.get(key).cloned()
    }

    fn insert(&self, key: CacheKey, outcome: Arc<MiningOutcome>) {
        let mut entries = self.lock();
        if entries.outcomes.insert(key, outcome).is_some() {
            return;
        }
        entries.insertion_order.push_back(key);
        while entries.outcomes.len() > self.capacity {
            let Some(oldest) = entries.insertion_order.pop_front() else {
                break;
            };
            entries.outcomes.remove(&oldest);
        }
    }

    fn invalidate_all(&self) {
        let mut entries = self.lock();
        entries.outcomes.clear();
        entries.insertion_order.clear();
    }
}

/// A [`Miner`] fronted by a [`MiningCache`]
pub struct CachedMiner {
    miner: Miner,
    cache: Arc<dyn MiningCache>,
}

impl CachedMiner {
    pub fn new(miner: Miner, cache: Arc<dyn MiningCache>) -> Self {
        Self { miner, cache }
    }

    /// Wrap `miner` with a cache that always recomputes
    pub fn uncached(miner: Miner) -> Self {
        Self::new(miner, Arc::new(NoopMiningCache))
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    pub fn cache(&self) -> &Arc<dyn MiningCache> {
        &self.cache
    }

    /// Return the memoized outcome for this history, mining on a miss.
    ///
    /// Parameters are validated before the lookup so invalid thresholds fail
    /// the same way with or without a warm cache.
    pub fn mine(&self, transactions: &[Transaction]) -> MiningResult<Arc<MiningOutcome>> {
        self.miner.params().validate()?;

        let key = CacheKey::compute(transactions, self.miner.params());
        if let Some(outcome) = self.cache.get(&key) {
            debug!(event_name = "mining.cache.hit", key = %key, "reusing mined outcome");
            return Ok(outcome);
        }

        let outcome = Arc::new(self.miner.mine(transactions)?);
        self.cache.insert(key, Arc::clone(&outcome));
        debug!(event_name = "mining.cache.miss", key = %key, "stored mined outcome");
        Ok(outcome)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

impl fmt::Debug for CachedMiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedMiner").field("miner", &self.miner).finish_non_exhaustive()
    }
}
