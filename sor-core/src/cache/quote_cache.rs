use std::collections::VecDeque;
use std::time::{Duration, Instant};

use alloy_primitives::Address;
use dashmap::DashMap;

use crate::routing::quoter::QuoteResponse;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct QuoteKey {
    token_in: Address,
    token_out: Address,
    amount_bucket: String,
    max_hops: usize,
    top_k: usize,
    enable_splitting: bool,
}

struct QuoteEntry {
    response: QuoteResponse,
    inserted_at: Instant,
}

/// TTL'd LRU over full `QuoteResponse`s, bucketing the input amount to the
/// first two significant digits so near-identical requests share an entry.
/// Specialized (not a generic `LruCache<K, V>`) so the bucketing and key
/// shape live next to the one cache that needs them.
pub struct QuoteCache {
    entries: DashMap<QuoteKey, QuoteEntry>,
    access_order: parking_lot::Mutex<VecDeque<QuoteKey>>,
    max_entries: usize,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            access_order: parking_lot::Mutex::new(VecDeque::with_capacity(max_entries)),
            max_entries,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub fn get(
        &self,
        token_in: Address,
        token_out: Address,
        amount_raw: u128,
        max_hops: usize,
        top_k: usize,
        enable_splitting: bool,
    ) -> Option<QuoteResponse> {
        let key = QuoteKey {
            token_in,
            token_out,
            amount_bucket: Self::bucket_amount(amount_raw),
            max_hops,
            top_k,
            enable_splitting,
        };

        if let Some(entry) = self.entries.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                self.touch(&key);
                return Some(entry.response.clone());
            }
        }
        self.entries.remove(&key);
        None
    }

    pub fn insert(
        &self,
        token_in: Address,
        token_out: Address,
        amount_raw: u128,
        max_hops: usize,
        top_k: usize,
        enable_splitting: bool,
        response: QuoteResponse,
    ) {
        let key = QuoteKey {
            token_in,
            token_out,
            amount_bucket: Self::bucket_amount(amount_raw),
            max_hops,
            top_k,
            enable_splitting,
        };

        if self.entries.len() >= self.max_entries {
            self.evict_lru();
        }

        self.entries.insert(
            key.clone(),
            QuoteEntry {
                response,
                inserted_at: Instant::now(),
            },
        );
        self.access_order.lock().push_back(key);
    }

    fn touch(&self, key: &QuoteKey) {
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

    /// Groups similar raw amounts together by rounding to 2 significant
    /// figures, same trick as the teacher's enhanced route cache used for
    /// single-hop route amounts.
    fn bucket_amount(amount_raw: u128) -> String {
        if amount_raw == 0 {
            return "0".to_string();
        }
        let amount_str = amount_raw.to_string();
        if amount_str.len() <= 2 {
            return amount_str;
        }
        let first_two: String = amount_str.chars().take(2).collect();
        let zeros = "0".repeat(amount_str.len() - 2);
        format!("{first_two}{zeros}")
    }

    pub fn stats(&self) -> QuoteCacheStats {
        QuoteCacheStats {
            size: self.entries.len(),
            max_entries: self.max_entries,
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.access_order.lock().clear();
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(2_000, 15)
    }
}

#[derive(Debug, Clone)]
pub struct QuoteCacheStats {
    pub size: usize,
    pub max_entries: usize,
}
