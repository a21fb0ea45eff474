use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::graph::Graph;
use crate::utils::types::TokenId;

const MAX_ITERATIONS: usize = 50_000;
const MAX_NODES: usize = 50_000;

/// Shortest reverse-path cost from every token to a target, used as the A*
/// admissible lower bound. `h[token]` missing means "unreachable"; callers
/// substitute 0.
#[derive(Debug, Clone)]
pub struct Heuristic {
    values: Vec<Option<f64>>,
    pub budget_exceeded: bool,
}

impl Heuristic {
    pub fn get(&self, token: TokenId) -> f64 {
        self.values.get(token).copied().flatten().unwrap_or(0.0)
    }
}

#[derive(PartialEq)]
struct HeapEntry {
    cost: f64,
    node: TokenId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: reverse the float comparison (treat NaN as largest).
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build the reverse-Dijkstra heuristic for `target` under edge cost
/// `max(0, -log_spot_price + gas_per_hop_penalty)`. The `max(0, ·)` clamp
/// keeps Dijkstra admissible on graphs with favorable (negative-cost) hops.
pub fn build_heuristic(graph: &Graph, target: TokenId, gas_per_hop_penalty: f64) -> Heuristic {
    let token_count = graph.token_count();
    let mut values: Vec<Option<f64>> = vec![None; token_count];
    if target >= token_count {
        return Heuristic {
            values,
            budget_exceeded: false,
        };
    }

    // Build a reverse adjacency: for edge from->to, reverse is to->from
    // with the same weight, since we want distance *to* the target.
    let mut reverse_adjacency: Vec<Vec<(TokenId, f64)>> = vec![Vec::new(); token_count];
    for token_id in 0..token_count {
        for edge in graph.edges_from(token_id) {
            let weight = (-edge.log_spot_price + gas_per_hop_penalty).max(0.0);
            reverse_adjacency[edge.to].push((edge.from, weight));
        }
    }

    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry {
        cost: 0.0,
        node: target,
    });
    values[target] = Some(0.0);

    let mut iterations = 0;
    let mut visited_nodes = 0;
    let mut budget_exceeded = false;

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        iterations += 1;
        if iterations > MAX_ITERATIONS || visited_nodes > MAX_NODES {
            budget_exceeded = true;
            break;
        }
        if let Some(existing) = values[node] {
            if cost > existing {
                continue;
            }
        }
        visited_nodes += 1;

        for &(neighbor, weight) in &reverse_adjacency[node] {
            let candidate = cost + weight;
            let better = match values[neighbor] {
                Some(existing) => candidate < existing,
                None => true,
            };
            if better {
                values[neighbor] = Some(candidate);
                heap.push(HeapEntry {
                    cost: candidate,
                    node: neighbor,
                });
            }
        }
    }

    Heuristic {
        values,
        budget_exceeded,
    }
}
