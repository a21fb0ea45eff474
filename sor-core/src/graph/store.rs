use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::edge::GraphEdge;
use super::node::Token;
use super::pool::Pool;
use crate::utils::types::{PoolId, TokenId};

/// The liquidity graph: a flat adjacency list indexed by numeric token id,
/// plus the address bijections needed to translate inbound requests.
///
/// Single-writer/many-readers: the [`crate::graph::dispatcher::GraphDispatcher`]
/// holds the only writer and quote handlers take a read lock for the
/// duration of one request, per the concurrency model.
pub struct Graph {
    adjacency: Arc<RwLock<Vec<Vec<GraphEdge>>>>,
    tokens: Arc<RwLock<Vec<Token>>>,
    pools: Arc<RwLock<Vec<Pool>>>,
    token_index: DashMap<Address, TokenId>,
    pool_index: DashMap<[u8; 32], PoolId>,
    last_update: AtomicU64,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            adjacency: Arc::new(RwLock::new(Vec::new())),
            tokens: Arc::new(RwLock::new(Vec::new())),
            pools: Arc::new(RwLock::new(Vec::new())),
            token_index: DashMap::new(),
            pool_index: DashMap::new(),
            last_update: AtomicU64::new(0),
        }
    }

    pub fn token_id(&self, addr: Address) -> Option<TokenId> {
        self.token_index.get(&addr).map(|v| *v)
    }

    pub fn pool_id(&self, pool_addr: [u8; 32]) -> Option<PoolId> {
        self.pool_index.get(&pool_addr).map(|v| *v)
    }

    pub fn token(&self, id: TokenId) -> Option<Token> {
        self.tokens.read().get(id).cloned()
    }

    pub fn pool(&self, id: PoolId) -> Option<Pool> {
        self.pools.read().get(id).cloned()
    }

    pub fn edges_from(&self, token_id: TokenId) -> Vec<GraphEdge> {
        self.adjacency
            .read()
            .get(token_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.read().iter().map(|e| e.len()).sum()
    }

    /// Register a token, returning its existing id if already known.
    pub(crate) fn intern_token(&self, token: Token) -> TokenId {
        if let Some(id) = self.token_index.get(&token.addr) {
            return *id;
        }
        let mut tokens = self.tokens.write();
        let id = tokens.len();
        tokens.push(token.clone());
        drop(tokens);
        self.adjacency.write().push(Vec::new());
        self.token_index.insert(token.addr, id);
        id
    }

    /// Register a pool, returning its existing id if already known.
    pub(crate) fn intern_pool(&self, pool: Pool) -> PoolId {
        if let Some(id) = self.pool_index.get(&pool.pool_id) {
            return *id;
        }
        let mut pools = self.pools.write();
        let id = pools.len();
        let pool_addr = pool.pool_id;
        pools.push(pool);
        self.pool_index.insert(pool_addr, id);
        id
    }

    /// Replace the outgoing edge list for a token wholesale. The caller
    /// (builder or dispatcher) is responsible for sort order and parallel
    /// edge compression before calling this.
    pub(crate) fn set_edges(&self, token_id: TokenId, edges: Vec<GraphEdge>) {
        let mut adjacency = self.adjacency.write();
        if token_id >= adjacency.len() {
            adjacency.resize_with(token_id + 1, Vec::new);
        }
        adjacency[token_id] = edges;
    }

    pub(crate) fn replace_pool(&self, id: PoolId, pool: Pool) {
        let mut pools = self.pools.write();
        if let Some(slot) = pools.get_mut(id) {
            *slot = pool;
        }
    }

    pub fn touch(&self) {
        self.last_update
            .store(chrono::Utc::now().timestamp() as u64, Ordering::Relaxed);
    }

    pub fn last_update(&self) -> u64 {
        self.last_update.load(Ordering::Relaxed)
    }

    /// BFS connectivity check. Not on the A* hot path (which uses the flat
    /// adjacency directly); exposed for diagnostics and `/health`.
    pub fn has_path(&self, from: Address, to: Address) -> bool {
        let (Some(start), Some(end)) = (self.token_id(from), self.token_id(to)) else {
            return false;
        };
        if start == end {
            return true;
        }
        let adjacency = self.adjacency.read();
        let mut visited = vec![false; adjacency.len()];
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(start);
        visited[start] = true;
        while let Some(node) = queue.pop_front() {
            for edge in &adjacency[node] {
                if edge.to == end {
                    return true;
                }
                if !visited[edge.to] {
                    visited[edge.to] = true;
                    queue.push_back(edge.to);
                }
            }
        }
        false
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            token_count: self.token_count(),
            pool_count: self.pool_count(),
            last_update: self.last_update(),
        }
    }

    /// Connected-component count over the undirected closure of the graph,
    /// for the `/health` diagnostic surface. Built off the hot-path flat
    /// adjacency; not used by the search itself.
    pub fn connected_components(&self) -> usize {
        let adjacency = self.adjacency.read();
        let mut pg = petgraph::graph::UnGraph::<(), ()>::with_capacity(adjacency.len(), 0);
        let nodes: Vec<_> = (0..adjacency.len()).map(|_| pg.add_node(())).collect();
        for (from, edges) in adjacency.iter().enumerate() {
            for edge in edges {
                pg.update_edge(nodes[from], nodes[edge.to], ());
            }
        }
        petgraph::algo::connected_components(&pg)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct GraphStats {
    pub token_count: usize,
    pub pool_count: usize,
    pub last_update: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::pool::{PoolTokenSlot, PoolVariant};
    use crate::utils::types::address_from_u64;

    #[test]
    fn test_empty_graph_stats() {
        let graph = Graph::new();
        let stats = graph.stats();
        assert_eq!(stats.token_count, 0);
        assert_eq!(stats.pool_count, 0);
    }

    #[test]
    fn test_intern_token_idempotent() {
        let graph = Graph::new();
        let token = Token::new(address_from_u64(1), "A", 18);
        let id1 = graph.intern_token(token.clone());
        let id2 = graph.intern_token(token);
        assert_eq!(id1, id2);
        assert_eq!(graph.token_count(), 1);
    }

    #[test]
    fn test_has_path_after_edges() {
        let graph = Graph::new();
        let a = graph.intern_token(Token::new(address_from_u64(1), "A", 18));
        let b = graph.intern_token(Token::new(address_from_u64(2), "B", 18));
        let pool = Pool::new(
            [1u8; 32],
            PoolVariant::ConstantProduct,
            0.003,
            [
                PoolTokenSlot {
                    token_id: a,
                    reserve_raw: 1_000_000,
                },
                PoolTokenSlot {
                    token_id: b,
                    reserve_raw: 1_000_000,
                },
            ],
        );
        let pool_id = graph.intern_pool(pool);
        graph.set_edges(
            a,
            vec![super::super::edge::GraphEdge::new(pool_id, a, b, 1.0, 1_000_000.0, 1_000)],
        );
        assert!(graph.has_path(address_from_u64(1), address_from_u64(2)));
        assert!(!graph.has_path(address_from_u64(2), address_from_u64(1)));
    }

    #[test]
    fn test_connected_components_counts_isolated_tokens() {
        let graph = Graph::new();
        graph.intern_token(Token::new(address_from_u64(1), "A", 18));
        graph.intern_token(Token::new(address_from_u64(2), "B", 18));
        assert_eq!(graph.connected_components(), 2);
    }
}
