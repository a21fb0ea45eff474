use super::builder::{build_edge, compress_parallel_edges, PoolRecord};
use super::pool::{Pool, PoolTokenSlot};
use super::store::Graph;

/// Reserve ratio changes below this are balanced liquidity ops and must not
/// perturb spot price.
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub enum PoolEvent {
    PoolCreated {
        record: PoolRecord,
    },
    PoolDisabled {
        pool_addr: [u8; 32],
    },
    LiquidityAdded {
        pool_addr: [u8; 32],
        new_reserve_a: u128,
        new_reserve_b: u128,
    },
    LiquidityRemoved {
        pool_addr: [u8; 32],
        new_reserve_a: u128,
        new_reserve_b: u128,
    },
    Swapped {
        pool_addr: [u8; 32],
        new_reserve_a: u128,
        new_reserve_b: u128,
    },
    FeeUpdated {
        pool_addr: [u8; 32],
        new_fee: f64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    pub received: usize,
    pub applied: usize,
    pub skipped: usize,
}

/// Applies a batched stream of pool mutation events to a [`Graph`] in place.
/// Holds the graph's only writer token for the duration of a batch; quote
/// handlers never observe a partially-applied event.
pub struct GraphDispatcher {
    graph: std::sync::Arc<Graph>,
}

impl GraphDispatcher {
    pub fn new(graph: std::sync::Arc<Graph>) -> Self {
        Self { graph }
    }

    pub fn apply_batch(&self, events: &[PoolEvent]) -> DispatchStats {
        let mut stats = DispatchStats {
            received: events.len(),
            ..Default::default()
        };
        for event in events {
            if self.apply_one(event) {
                stats.applied += 1;
            } else {
                stats.skipped += 1;
            }
        }
        if stats.applied > 0 {
            self.graph.touch();
        }
        stats
    }

    fn apply_one(&self, event: &PoolEvent) -> bool {
        match event {
            PoolEvent::PoolCreated { record } => self.apply_created(record),
            PoolEvent::PoolDisabled { pool_addr } => self.apply_disabled(*pool_addr),
            PoolEvent::LiquidityAdded {
                pool_addr,
                new_reserve_a,
                new_reserve_b,
            }
            | PoolEvent::LiquidityRemoved {
                pool_addr,
                new_reserve_a,
                new_reserve_b,
            } => self.apply_liquidity_change(*pool_addr, *new_reserve_a, *new_reserve_b, true),
            PoolEvent::Swapped {
                pool_addr,
                new_reserve_a,
                new_reserve_b,
            } => self.apply_liquidity_change(*pool_addr, *new_reserve_a, *new_reserve_b, false),
            PoolEvent::FeeUpdated { pool_addr, new_fee } => self.apply_fee_update(*pool_addr, *new_fee),
        }
    }

    fn apply_created(&self, record: &PoolRecord) -> bool {
        use super::node::Token;

        let token_a_id = self.graph.intern_token(Token::new(
            record.token_a.addr,
            record.token_a.symbol.clone(),
            record.token_a.decimals,
        ));
        let token_b_id = self.graph.intern_token(Token::new(
            record.token_b.addr,
            record.token_b.symbol.clone(),
            record.token_b.decimals,
        ));
        let pool = Pool::new(
            record.pool_addr,
            record.variant.clone(),
            record.fee,
            [
                PoolTokenSlot {
                    token_id: token_a_id,
                    reserve_raw: record.token_a.reserve_raw,
                },
                PoolTokenSlot {
                    token_id: token_b_id,
                    reserve_raw: record.token_b.reserve_raw,
                },
            ],
        );
        let pool_id = self.graph.intern_pool(pool.clone());
        self.recompute_edges(pool_id, token_a_id, token_b_id, &pool);
        true
    }

    fn apply_disabled(&self, pool_addr: [u8; 32]) -> bool {
        let Some(pool_id) = self.graph.pool_id(pool_addr) else {
            return false;
        };
        let Some(pool) = self.graph.pool(pool_id) else {
            return false;
        };
        let token_a_id = pool.slots[0].token_id;
        let token_b_id = pool.slots[1].token_id;
        self.strip_pool_edges(pool_id, token_a_id);
        self.strip_pool_edges(pool_id, token_b_id);
        true
    }

    fn apply_liquidity_change(
        &self,
        pool_addr: [u8; 32],
        new_reserve_a: u128,
        new_reserve_b: u128,
        gated_by_ratio: bool,
    ) -> bool {
        let Some(pool_id) = self.graph.pool_id(pool_addr) else {
            return false;
        };
        let Some(mut pool) = self.graph.pool(pool_id) else {
            return false;
        };

        let old_ratio = ratio(pool.slots[0].reserve_raw, pool.slots[1].reserve_raw);
        let new_ratio = ratio(new_reserve_a, new_reserve_b);

        if gated_by_ratio && (new_ratio - old_ratio).abs() <= EPSILON * old_ratio.max(1e-12) {
            return false;
        }

        let token_a_id = pool.slots[0].token_id;
        let token_b_id = pool.slots[1].token_id;
        pool.slots[0].reserve_raw = new_reserve_a;
        pool.slots[1].reserve_raw = new_reserve_b;
        self.graph.replace_pool(pool_id, pool.clone());
        self.recompute_edges(pool_id, token_a_id, token_b_id, &pool);
        true
    }

    fn apply_fee_update(&self, pool_addr: [u8; 32], new_fee: f64) -> bool {
        let Some(pool_id) = self.graph.pool_id(pool_addr) else {
            return false;
        };
        let Some(mut pool) = self.graph.pool(pool_id) else {
            return false;
        };
        if (pool.fee - new_fee).abs() <= f64::EPSILON {
            return false;
        }
        let token_a_id = pool.slots[0].token_id;
        let token_b_id = pool.slots[1].token_id;
        pool.fee = new_fee;
        self.graph.replace_pool(pool_id, pool.clone());
        self.recompute_edges(pool_id, token_a_id, token_b_id, &pool);
        true
    }

    fn strip_pool_edges(&self, pool_id: usize, token_id: usize) {
        let edges: Vec<_> = self
            .graph
            .edges_from(token_id)
            .into_iter()
            .filter(|e| e.pool_id != pool_id)
            .collect();
        self.graph.set_edges(token_id, edges);
    }

    fn recompute_edges(&self, pool_id: usize, token_a_id: usize, token_b_id: usize, pool: &Pool) {
        for (from, to) in [(token_a_id, token_b_id), (token_b_id, token_a_id)] {
            let mut edges: Vec<_> = self
                .graph
                .edges_from(from)
                .into_iter()
                .filter(|e| e.pool_id != pool_id)
                .collect();
            if let Some(edge) = build_edge(pool, pool_id, from, to) {
                edges.push(edge);
            }
            self.graph.set_edges(from, edges);
        }
        compress_parallel_edges(&self.graph, token_a_id);
        compress_parallel_edges(&self.graph, token_b_id);
    }
}

fn ratio(a: u128, b: u128) -> f64 {
    if b == 0 {
        return 0.0;
    }
    a as f64 / b as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{build_graph, TokenRecord};
    use crate::graph::pool::PoolVariant;
    use crate::utils::types::address_from_u64;

    fn record(pool_addr: u8, reserve_a: u128, reserve_b: u128) -> PoolRecord {
        PoolRecord {
            pool_addr: [pool_addr; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: TokenRecord {
                addr: address_from_u64(1),
                symbol: "A".into(),
                decimals: 18,
                reserve_raw: reserve_a,
            },
            token_b: TokenRecord {
                addr: address_from_u64(2),
                symbol: "B".into(),
                decimals: 18,
                reserve_raw: reserve_b,
            },
        }
    }

    #[test]
    fn test_balanced_liquidity_add_is_noop() {
        let graph = std::sync::Arc::new(build_graph(&[record(1, 1_000_000_000, 1_000_000_000)]));
        let dispatcher = GraphDispatcher::new(graph.clone());
        let a = graph.token_id(address_from_u64(1)).unwrap();
        let before = graph.edges_from(a)[0].log_spot_price;

        let stats = dispatcher.apply_batch(&[PoolEvent::LiquidityAdded {
            pool_addr: [1; 32],
            new_reserve_a: 2_000_000_000,
            new_reserve_b: 2_000_000_000,
        }]);

        assert_eq!(stats.applied, 0);
        assert_eq!(stats.skipped, 1);
        let after = graph.edges_from(a)[0].log_spot_price;
        assert_eq!(before, after);
    }

    #[test]
    fn test_swap_event_always_updates() {
        let graph = std::sync::Arc::new(build_graph(&[record(1, 1_000_000_000, 1_000_000_000)]));
        let dispatcher = GraphDispatcher::new(graph.clone());

        let stats = dispatcher.apply_batch(&[PoolEvent::Swapped {
            pool_addr: [1; 32],
            new_reserve_a: 1_100_000_000,
            new_reserve_b: 900_000_000,
        }]);
        assert_eq!(stats.applied, 1);
    }

    #[test]
    fn test_pool_disabled_removes_edges() {
        let graph = std::sync::Arc::new(build_graph(&[record(1, 1_000_000_000, 1_000_000_000)]));
        let dispatcher = GraphDispatcher::new(graph.clone());
        let a = graph.token_id(address_from_u64(1)).unwrap();
        assert!(!graph.edges_from(a).is_empty());

        dispatcher.apply_batch(&[PoolEvent::PoolDisabled { pool_addr: [1; 32] }]);
        assert!(graph.edges_from(a).is_empty());
    }
}
