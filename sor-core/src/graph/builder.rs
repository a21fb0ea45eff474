use alloy_primitives::{Address, U256};

use super::edge::{GraphEdge, CAP_SENTINEL};
use super::node::Token;
use super::pool::{Pool, PoolOracle, PoolTokenSlot, PoolVariant};
use super::store::Graph;
use crate::utils::math;

/// Fraction of `reserveIn` used as the shallow-pool probe trade.
const PROBE_FRACTION: f64 = 0.001;
const PROBE_CAP: f64 = 1e9;
const SHALLOW_IMPACT_THRESHOLD: f64 = 0.05;
/// Fraction of `reserveOut` the per-edge cap is solved to remove.
const CAP_DRAIN_FRACTION: f64 = 0.95;
/// Parallel-edge survival tolerance (50 bps).
const PARALLEL_EDGE_TOLERANCE: f64 = 0.005;

/// One pool as reported by the external pool-data collaborator: two token
/// records with reserves, a fee, and a variant. This is the boundary shape
/// the Graph Builder consumes; it never sees `PoolOracle` trait objects from
/// outside.
#[derive(Debug, Clone)]
pub struct PoolRecord {
    pub pool_addr: [u8; 32],
    pub variant: PoolVariant,
    pub fee: f64,
    pub token_a: TokenRecord,
    pub token_b: TokenRecord,
}

#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub addr: Address,
    pub symbol: String,
    pub decimals: u8,
    pub reserve_raw: u128,
}

/// Build a fresh [`Graph`] from a pool set. Silently drops edges failing the
/// shallow-pool or zero-reserve filters; never fails as a whole unless
/// called with an empty set (which just yields an empty graph).
pub fn build_graph(records: &[PoolRecord]) -> Graph {
    let graph = Graph::new();
    let mut touched_tokens = std::collections::BTreeSet::new();

    for record in records {
        let token_a_id = graph.intern_token(Token::new(
            record.token_a.addr,
            record.token_a.symbol.clone(),
            record.token_a.decimals,
        ));
        let token_b_id = graph.intern_token(Token::new(
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
        let pool_id = graph.intern_pool(pool.clone());

        for (from, to) in [(token_a_id, token_b_id), (token_b_id, token_a_id)] {
            if let Some(edge) = build_edge(&pool, pool_id, from, to) {
                touched_tokens.insert(from);
                append_candidate(&graph, from, edge);
            }
        }
    }

    for token_id in touched_tokens {
        compress_parallel_edges(&graph, token_id);
    }

    graph.touch();
    graph
}

pub(crate) fn build_edge(pool: &Pool, pool_id: usize, from: usize, to: usize) -> Option<GraphEdge> {
    let slot_in = pool.token_slot(from)?;
    let slot_out = pool.token_slot(to)?;
    if slot_in.reserve_raw < 1 || slot_out.reserve_raw < 1 {
        return None;
    }

    let spot_price = pool.spot_price(from, to);
    if spot_price <= 0.0 {
        return None;
    }

    let reserve_in_f = slot_in.reserve_raw as f64;
    let probe = (PROBE_FRACTION * reserve_in_f).min(PROBE_CAP);
    let impact = probe / (reserve_in_f + probe);
    if impact > SHALLOW_IMPACT_THRESHOLD {
        return None;
    }

    let reserve_in = U256::from(slot_in.reserve_raw);
    let reserve_out = U256::from(slot_out.reserve_raw);
    let liquidity_score = math::liquidity_score(reserve_in, reserve_out);
    let dx_cap_raw = solve_dx_cap(slot_in.reserve_raw);

    Some(GraphEdge::new(
        pool_id,
        from,
        to,
        spot_price,
        liquidity_score,
        dx_cap_raw,
    ))
}

/// Closed-form constant-product solution for the input that drains
/// `CAP_DRAIN_FRACTION` of `reserveOut`, used irrespective of the pool's
/// actual variant — a coarse per-edge ceiling, not a correctness bound.
fn solve_dx_cap(reserve_in_raw: u128) -> u128 {
    let reserve_in = reserve_in_raw as f64;
    let dx = reserve_in * CAP_DRAIN_FRACTION / (1.0 - CAP_DRAIN_FRACTION);
    if !dx.is_finite() || dx <= 0.0 {
        CAP_SENTINEL
    } else {
        dx.min(CAP_SENTINEL as f64) as u128
    }
}

fn append_candidate(graph: &Graph, from: usize, edge: GraphEdge) {
    let mut edges = graph.edges_from(from);
    edges.push(edge);
    graph.set_edges(from, edges);
}

/// Group edges out of `token_id` by `to`, keep the best-scoring edge per
/// destination plus a second if within 50 bps of spot price, then re-sort
/// the survivors by score descending.
pub(crate) fn compress_parallel_edges(graph: &Graph, token_id: usize) {
    let mut edges = graph.edges_from(token_id);
    edges.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut by_destination: std::collections::HashMap<usize, Vec<GraphEdge>> =
        std::collections::HashMap::new();
    for edge in edges {
        by_destination.entry(edge.to).or_default().push(edge);
    }

    let mut survivors = Vec::new();
    for (_, mut group) in by_destination {
        group.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(best) = group.first().cloned() {
            let best_price = best.spot_price;
            survivors.push(best);
            if let Some(second) = group.get(1) {
                if best_price > 0.0
                    && ((second.spot_price - best_price).abs() / best_price) <= PARALLEL_EDGE_TOLERANCE
                {
                    survivors.push(second.clone());
                }
            }
        }
    }

    survivors.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.pool_id.cmp(&b.pool_id))
    });
    graph.set_edges(token_id, survivors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::types::address_from_u64;

    fn token_record(n: u64, symbol: &str, decimals: u8, reserve: u128) -> TokenRecord {
        TokenRecord {
            addr: address_from_u64(n),
            symbol: symbol.to_string(),
            decimals,
            reserve_raw: reserve,
        }
    }

    #[test]
    fn test_build_graph_simple_pool() {
        let records = vec![PoolRecord {
            pool_addr: [1u8; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: token_record(1, "A", 8, 5_000_000_000),
            token_b: token_record(2, "U", 6, 25_000_000_000_000),
        }];
        let graph = build_graph(&records);
        assert_eq!(graph.token_count(), 2);
        assert_eq!(graph.pool_count(), 1);

        let a = graph.token_id(address_from_u64(1)).unwrap();
        let edges = graph.edges_from(a);
        assert_eq!(edges.len(), 1);
        assert!(edges[0].spot_price > 0.0);
    }

    #[test]
    fn test_zero_reserve_pool_dropped() {
        let records = vec![PoolRecord {
            pool_addr: [1u8; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: token_record(1, "A", 8, 0),
            token_b: token_record(2, "U", 6, 1_000_000),
        }];
        let graph = build_graph(&records);
        let a = graph.token_id(address_from_u64(1)).unwrap();
        assert!(graph.edges_from(a).is_empty());
    }

    #[test]
    fn test_parallel_edge_compression_keeps_at_most_two() {
        let mut records = Vec::new();
        for i in 0..4u64 {
            records.push(PoolRecord {
                pool_addr: [i as u8 + 10; 32],
                variant: PoolVariant::ConstantProduct,
                fee: 0.003,
                token_a: token_record(1, "A", 18, 1_000_000_000_000),
                token_b: token_record(2, "B", 18, 1_000_000_000_000 + i as u128 * 1_000_000),
            });
        }
        let graph = build_graph(&records);
        let a = graph.token_id(address_from_u64(1)).unwrap();
        assert!(graph.edges_from(a).len() <= 2);
    }
}
