use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use super::heuristic::Heuristic;
use super::path::Path;
use crate::graph::{Graph, GraphEdge};
use crate::utils::types::{TokenId, MAX_HOPS_BITWIDTH};

pub const MAX_ITERATIONS: usize = 50_000;
pub const WALL_CLOCK_BUDGET: Duration = Duration::from_secs(5);

/// One node in the search arena. States carry a parent index rather than a
/// materialized path; paths are reconstructed only on reaching the target.
struct ArenaNode {
    token: TokenId,
    parent: Option<usize>,
    edge: Option<GraphEdge>,
    g: f64,
    hops: usize,
    prev_node: TokenId,
    /// Bit `i` set means some token with `id % MAX_HOPS_BITWIDTH == i` has
    /// been visited on the path leading to this node. A clear bit proves
    /// the candidate token is absent without walking the parent chain; a
    /// set bit only means "maybe" (residues can collide) and falls back to
    /// an exact walk via `path_contains`.
    visited_mask: u64,
}

fn residue_bit(token: TokenId) -> u64 {
    1u64 << (token % MAX_HOPS_BITWIDTH)
}

struct FrontierEntry {
    prio: f64,
    arena_idx: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.prio == other.prio
    }
}
impl Eq for FrontierEntry {}
impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prio.partial_cmp(&other.prio).unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Default)]
pub struct AstarResult {
    pub paths: Vec<Path>,
    pub budget_exceeded: bool,
    pub nodes_explored: usize,
}

/// Best-first top-K search, beam-bounded, with dominance pruning and an
/// admissible early-termination rule. See spec section 4.4 for the full
/// state machine; this is a direct transcription.
pub fn find_top_k_routes(
    graph: &Graph,
    heuristic: &Heuristic,
    source: TokenId,
    target: TokenId,
    max_hops: usize,
    k: usize,
    beam_width: usize,
) -> AstarResult {
    find_top_k_routes_with_penalty(graph, heuristic, source, target, max_hops, k, beam_width, 0.0)
}

pub fn find_top_k_routes_with_penalty(
    graph: &Graph,
    heuristic: &Heuristic,
    source: TokenId,
    target: TokenId,
    max_hops: usize,
    k: usize,
    beam_width: usize,
    gas_per_hop_penalty: f64,
) -> AstarResult {
    if source == target || k == 0 {
        return AstarResult::default();
    }

    let mut arena = vec![ArenaNode {
        token: source,
        parent: None,
        edge: None,
        g: 0.0,
        hops: 0,
        prev_node: usize::MAX,
        visited_mask: residue_bit(source),
    }];

    let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();
    frontier.push(FrontierEntry {
        prio: priority(0.0, heuristic.get(source), gas_per_hop_penalty, max_hops, 0),
        arena_idx: 0,
    });

    // Sorted descending by terminal score, length capped at k.
    let mut candidates: Vec<(f64, Path)> = Vec::new();
    let mut seen_routes: HashSet<Vec<usize>> = HashSet::new();
    let mut best_at_depth: HashMap<(TokenId, usize), f64> = HashMap::new();

    for edge in graph.edges_from(source) {
        if edge.to == target {
            let score = edge.log_spot_price - gas_per_hop_penalty;
            let path = Path::from_edges(std::slice::from_ref(&edge), score);
            let seq = path.pool_sequence();
            if seen_routes.insert(seq) {
                insert_candidate(&mut candidates, k, score, path);
            }
        }
    }

    let start_time = Instant::now();
    let mut iterations = 0usize;
    let mut budget_exceeded = false;
    let mut nodes_explored = 0usize;

    loop {
        if iterations >= MAX_ITERATIONS {
            budget_exceeded = true;
            break;
        }
        if start_time.elapsed() > WALL_CLOCK_BUDGET {
            budget_exceeded = true;
            break;
        }

        let kth_score = if candidates.len() >= k && k > 0 {
            candidates.last().map(|(s, _)| *s).unwrap_or(f64::NEG_INFINITY)
        } else {
            f64::NEG_INFINITY
        };

        match frontier.peek() {
            Some(top) if candidates.len() >= k && top.prio <= kth_score => break,
            Some(_) => {}
            None => break,
        }

        let mut popped = Vec::new();
        for _ in 0..beam_width.max(1) {
            match frontier.pop() {
                Some(entry) => {
                    popped.push(entry);
                    iterations += 1;
                }
                None => break,
            }
            if iterations >= MAX_ITERATIONS {
                break;
            }
        }
        if popped.is_empty() {
            break;
        }

        for entry in popped {
            nodes_explored += 1;
            let (token, hops, g, prev_node) = {
                let state = &arena[entry.arena_idx];
                (state.token, state.hops, state.g, state.prev_node)
            };
            if hops >= max_hops {
                continue;
            }

            let edges = graph.edges_from(token);
            let per_node_cap = edges.len().min(8.max(beam_width / 2));

            for edge in edges.iter().take(per_node_cap) {
                if edge.to == prev_node {
                    continue;
                }
                if path_contains(&arena, entry.arena_idx, edge.to) {
                    continue;
                }

                let g_prime = g + edge.log_spot_price - gas_per_hop_penalty;
                let hops_prime = hops + 1;

                if edge.to == target {
                    let path = reconstruct_path(&arena, entry.arena_idx, edge.clone(), g_prime);
                    let seq = path.pool_sequence();
                    let current_kth = if candidates.len() >= k && k > 0 {
                        candidates.last().map(|(s, _)| *s).unwrap_or(f64::NEG_INFINITY)
                    } else {
                        f64::NEG_INFINITY
                    };
                    if !seen_routes.contains(&seq) && (candidates.len() < k || g_prime > current_kth) {
                        seen_routes.insert(seq);
                        insert_candidate(&mut candidates, k, g_prime, path);
                    }
                    continue;
                }

                let dom_key = (edge.to, hops_prime);
                let dominant = best_at_depth.get(&dom_key).copied().unwrap_or(f64::NEG_INFINITY);
                if g_prime <= dominant {
                    continue;
                }
                best_at_depth.insert(dom_key, g_prime);

                let h_to = heuristic.get(edge.to);
                let prio_prime = priority(g_prime, h_to, gas_per_hop_penalty, max_hops, hops_prime);

                arena.push(ArenaNode {
                    token: edge.to,
                    parent: Some(entry.arena_idx),
                    edge: Some(edge.clone()),
                    g: g_prime,
                    hops: hops_prime,
                    prev_node: token,
                    visited_mask: arena[entry.arena_idx].visited_mask | residue_bit(edge.to),
                });
                frontier.push(FrontierEntry {
                    prio: prio_prime,
                    arena_idx: arena.len() - 1,
                });
            }
        }

        let frontier_cap = (beam_width * 32).max(k * 128);
        if frontier.len() > frontier_cap {
            let mut entries: Vec<_> = frontier.into_vec();
            entries.sort_by(|a, b| b.prio.partial_cmp(&a.prio).unwrap_or(Ordering::Equal));
            entries.truncate(frontier_cap);
            frontier = BinaryHeap::from(entries);
        }
    }

    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    let paths = candidates.into_iter().map(|(_, p)| p).take(k).collect();

    AstarResult {
        paths,
        budget_exceeded,
        nodes_explored,
    }
}

fn priority(g: f64, h: f64, gas_per_hop_penalty: f64, max_hops: usize, hops: usize) -> f64 {
    let rem_hops = max_hops.saturating_sub(hops) as f64;
    g - h - gas_per_hop_penalty * rem_hops
}

/// Cycle check along the parent chain up to `idx`. The residue bitset on
/// `arena[idx]` rules out the common case in one comparison; a set bit
/// falls back to the exact walk since two tokens can share a residue.
fn path_contains(arena: &[ArenaNode], idx: usize, token: TokenId) -> bool {
    if arena[idx].visited_mask & residue_bit(token) == 0 {
        return false;
    }
    let mut cursor = idx;
    loop {
        if arena[cursor].token == token {
            return true;
        }
        match arena[cursor].parent {
            Some(parent_idx) => cursor = parent_idx,
            None => return false,
        }
    }
}

fn reconstruct_path(arena: &[ArenaNode], leaf_idx: usize, final_edge: GraphEdge, terminal_score: f64) -> Path {
    let mut edges = vec![final_edge];
    let mut idx = leaf_idx;
    loop {
        if let Some(edge) = &arena[idx].edge {
            edges.push(edge.clone());
        }
        match arena[idx].parent {
            Some(parent_idx) => idx = parent_idx,
            None => break,
        }
    }
    edges.reverse();
    Path::from_edges(&edges, terminal_score)
}

fn insert_candidate(candidates: &mut Vec<(f64, Path)>, k: usize, score: f64, path: Path) {
    let pos = candidates
        .iter()
        .position(|(s, _)| score > *s)
        .unwrap_or(candidates.len());
    candidates.insert(pos, (score, path));
    if candidates.len() > k.max(1) {
        candidates.truncate(k.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{build_graph, PoolRecord, TokenRecord};
    use crate::graph::pool::PoolVariant;
    use crate::routing::heuristic::build_heuristic;
    use crate::utils::types::address_from_u64;

    fn chain_graph() -> Graph {
        // A -> B -> C -> D plus a direct A -> D shortcut.
        let mut records = vec![
            pool_record(1, 0, 1, 1_000_000_000_000, 1_000_000_000_000),
            pool_record(2, 1, 2, 1_000_000_000_000, 1_000_000_000_000),
            pool_record(3, 2, 3, 1_000_000_000_000, 1_000_000_000_000),
        ];
        records.push(pool_record(4, 0, 3, 1_000_000_000_000, 900_000_000_000));
        build_graph(&records)
    }

    fn pool_record(id: u8, a: u64, b: u64, reserve_a: u128, reserve_b: u128) -> PoolRecord {
        PoolRecord {
            pool_addr: [id; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: TokenRecord {
                addr: address_from_u64(a),
                symbol: format!("T{a}"),
                decimals: 18,
                reserve_raw: reserve_a,
            },
            token_b: TokenRecord {
                addr: address_from_u64(b),
                symbol: format!("T{b}"),
                decimals: 18,
                reserve_raw: reserve_b,
            },
        }
    }

    #[test]
    fn test_direct_edge_always_seeded() {
        let graph = chain_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let target = graph.token_id(address_from_u64(3)).unwrap();
        let heuristic = build_heuristic(&graph, target, 0.0);
        let result = find_top_k_routes(&graph, &heuristic, source, target, 1, 5, 8);
        assert!(result.paths.iter().any(|p| p.hop_count() == 1));
    }

    #[test]
    fn test_multi_hop_reaches_target() {
        let graph = chain_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let target = graph.token_id(address_from_u64(3)).unwrap();
        let heuristic = build_heuristic(&graph, target, 0.0);
        let result = find_top_k_routes(&graph, &heuristic, source, target, 3, 5, 8);
        assert!(!result.paths.is_empty());
        for path in &result.paths {
            assert_eq!(path.source(), Some(source));
            assert_eq!(path.target(), Some(target));
            assert!(path.hop_count() <= 3);
        }
    }

    #[test]
    fn test_paths_are_unique_by_pool_sequence() {
        let graph = chain_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let target = graph.token_id(address_from_u64(3)).unwrap();
        let heuristic = build_heuristic(&graph, target, 0.0);
        let result = find_top_k_routes(&graph, &heuristic, source, target, 3, 10, 8);
        let mut sequences: Vec<_> = result.paths.iter().map(|p| p.pool_sequence()).collect();
        let before = sequences.len();
        sequences.sort();
        sequences.dedup();
        assert_eq!(sequences.len(), before);
    }

    #[test]
    fn test_source_equals_target_returns_empty() {
        let graph = chain_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let heuristic = build_heuristic(&graph, source, 0.0);
        let result = find_top_k_routes(&graph, &heuristic, source, source, 3, 5, 8);
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_paths_sorted_by_score_descending() {
        let graph = chain_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let target = graph.token_id(address_from_u64(3)).unwrap();
        let heuristic = build_heuristic(&graph, target, 0.0);
        let result = find_top_k_routes(&graph, &heuristic, source, target, 3, 10, 8);
        for pair in result.paths.windows(2) {
            assert!(pair[0].terminal_score >= pair[1].terminal_score);
        }
    }
}
