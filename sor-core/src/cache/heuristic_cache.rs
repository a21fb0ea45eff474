use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::graph::Graph;
use crate::routing::heuristic::{build_heuristic, Heuristic};
use crate::utils::types::TokenId;

/// Heuristic cache keyed by graph shape, not graph identity: a reverse-
/// Dijkstra table stays valid for a given `(token_count, edge_count,
/// target, gasPerHopPenalty)` tuple until the graph's shape changes, per
/// the "stale entries are acceptable, still admissible" concurrency note.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct HeuristicKey {
    token_count: usize,
    edge_count: usize,
    target: TokenId,
    gas_penalty_bits: u64,
}

struct HeuristicEntry {
    heuristic: Arc<Heuristic>,
    built_at: Instant,
}

/// TTL'd LRU over built heuristics. Specialized (not a generic `LruCache<K, V>`)
/// because eviction here is shape-keyed and `get_or_build` needs to fall
/// through to `build_heuristic` on a miss, which a generic cache can't express.
pub struct HeuristicCache {
    entries: DashMap<HeuristicKey, HeuristicEntry>,
    access_order: parking_lot::Mutex<VecDeque<HeuristicKey>>,
    max_entries: usize,
    ttl: Duration,
}

impl HeuristicCache {
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            access_order: parking_lot::Mutex::new(VecDeque::with_capacity(max_entries)),
            max_entries,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Returns a cached heuristic matching the graph's current shape, or
    /// builds and caches a fresh one. Last-writer-wins on a race.
    pub fn get_or_build(&self, graph: &Graph, target: TokenId, gas_per_hop_penalty: f64) -> Arc<Heuristic> {
        let key = HeuristicKey {
            token_count: graph.token_count(),
            edge_count: graph.edge_count(),
            target,
            gas_penalty_bits: gas_per_hop_penalty.to_bits(),
        };

        if let Some(entry) = self.entries.get(&key) {
            if entry.built_at.elapsed() < self.ttl {
                self.touch(&key);
                return entry.heuristic.clone();
            }
        }
        self.entries.remove(&key);

        let built = Arc::new(build_heuristic(graph, target, gas_per_hop_penalty));
        self.insert(key, built.clone());
        built
    }

    fn insert(&self, key: HeuristicKey, heuristic: Arc<Heuristic>) {
        if self.entries.len() >= self.max_entries {
            self.evict_lru();
        }
        self.entries.insert(
            key.clone(),
            HeuristicEntry {
                heuristic,
                built_at: Instant::now(),
            },
        );
        self.access_order.lock().push_back(key);
    }

    fn touch(&self, key: &HeuristicKey) {
        let mut order = self.access_order.lock();
        if let Some(pos) = order.iter().position(|k| k == key) {
            order.remove(pos);
        }
        order.push_back(key.clone());
    }

    fn evict_lru(&self) {
        let mut order = self.access_order.lock();
        if let Some(key) = order.pop_front() {
            self.entries.remove(&key);
        }
    }

    pub fn stats(&self) -> HeuristicCacheStats {
        HeuristicCacheStats {
            size: self.entries.len(),
            max_entries: self.max_entries,
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.access_order.lock().clear();
    }
}

impl Default for HeuristicCache {
    fn default() -> Self {
        Self::new(256, 30)
    }
}

#[derive(Debug, Clone)]
pub struct HeuristicCacheStats {
    pub size: usize,
    pub max_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{build_graph, PoolRecord, TokenRecord};
    use crate::graph::pool::PoolVariant;
    use crate::utils::types::address_from_u64;

    fn small_graph() -> Graph {
        let records = vec![PoolRecord {
            pool_addr: [1u8; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: TokenRecord {
                addr: address_from_u64(0),
                symbol: "A".into(),
                decimals: 18,
                reserve_raw: 1_000_000_000,
            },
            token_b: TokenRecord {
                addr: address_from_u64(1),
                symbol: "B".into(),
                decimals: 18,
                reserve_raw: 1_000_000_000,
            },
        }];
        build_graph(&records)
    }

    #[test]
    fn test_cache_hit_returns_same_values() {
        let graph = small_graph();
        let target = graph.token_id(address_from_u64(1)).unwrap();
        let cache = HeuristicCache::default();

        let first = cache.get_or_build(&graph, target, 0.001);
        let second = cache.get_or_build(&graph, target, 0.001);
        assert_eq!(first.get(target), second.get(target));
    }

    #[test]
    fn test_different_gas_penalty_is_a_different_key() {
        let graph = small_graph();
        let target = graph.token_id(address_from_u64(1)).unwrap();
        let cache = HeuristicCache::new(256, 30);

        cache.get_or_build(&graph, target, 0.0);
        assert_eq!(cache.stats().size, 1);
        cache.get_or_build(&graph, target, 0.5);
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let graph = small_graph();
        let target = graph.token_id(address_from_u64(1)).unwrap();
        let cache = HeuristicCache::new(1, 30);

        cache.get_or_build(&graph, target, 0.0);
        cache.get_or_build(&graph, target, 0.5);
        assert_eq!(cache.stats().size, 1);
    }
}
