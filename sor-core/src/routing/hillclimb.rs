use super::curve::ResponseCurve;
use super::waterfill::{Allocation, PathAllocation};

const MAX_ITERATIONS: usize = 200;
const MAX_ACTIVE_ROUTES: usize = 10;
const DELTA_FRACTION: f64 = 0.001;

/// Greedy single-move hill climb used as a cross-check against the
/// water-fill splitter (§4.8). Starts all input on the first path and
/// repeatedly moves the largest-gain `delta` chunk between two paths
/// until no move improves total output.
pub fn hill_climb(curves: &[(usize, ResponseCurve)], total_input_raw: u128) -> Allocation {
    let n = curves.len();
    let mut iterations = 0usize;
    let mut budget_exceeded = false;

    if n == 0 || total_input_raw == 0 {
        return Allocation {
            allocations: Vec::new(),
            total_input_raw,
            total_output_raw: 0,
            iterations,
            budget_exceeded,
        };
    }

    let caps: Vec<u128> = curves.iter().map(|(_, c)| c.cap_raw()).collect();
    let mut x: Vec<u128> = vec![0; n];
    x[0] = total_input_raw.min(caps[0].max(total_input_raw));

    let delta = ((total_input_raw as f64) * DELTA_FRACTION).round().max(1.0) as u128;

    loop {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            budget_exceeded = true;
            break;
        }

        let mut best_gain = 0.0_f64;
        let mut best_move: Option<(usize, usize)> = None;

        for i in 0..n {
            if x[i] < delta {
                continue;
            }
            let loss = marginal_loss(&curves[i].1, x[i], delta);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let room = caps[j].saturating_sub(x[j]);
                if room < delta {
                    continue;
                }
                let gain = marginal_gain(&curves[j].1, x[j], delta);
                let net = gain - loss;
                if net > best_gain {
                    best_gain = net;
                    best_move = Some((i, j));
                }
            }
        }

        match best_move {
            None => break,
            Some((i, j)) => {
                x[i] -= delta;
                x[j] += delta;
                fold_excess_active_routes(&mut x);
            }
        }
    }

    finalize(curves, x, total_input_raw, iterations, budget_exceeded)
}

fn marginal_gain(curve: &ResponseCurve, x: u128, delta: u128) -> f64 {
    let before = curve.output_at(x) as f64;
    let after = curve.output_at(x + delta) as f64;
    (after - before).max(0.0)
}

fn marginal_loss(curve: &ResponseCurve, x: u128, delta: u128) -> f64 {
    let before = curve.output_at(x) as f64;
    let after = curve.output_at(x.saturating_sub(delta)) as f64;
    (before - after).max(0.0)
}

/// If more than `MAX_ACTIVE_ROUTES` paths hold nonzero input, fold the
/// smallest active allocation into the largest until back under budget.
fn fold_excess_active_routes(x: &mut [u128]) {
    loop {
        let active: Vec<usize> = (0..x.len()).filter(|&i| x[i] > 0).collect();
        if active.len() <= MAX_ACTIVE_ROUTES {
            return;
        }
        let smallest = *active.iter().min_by_key(|&&i| x[i]).unwrap();
        let largest = *active.iter().max_by_key(|&&i| x[i]).unwrap();
        if smallest == largest {
            return;
        }
        x[largest] += x[smallest];
        x[smallest] = 0;
    }
}

fn finalize(
    curves: &[(usize, ResponseCurve)],
    x: Vec<u128>,
    total_input_raw: u128,
    iterations: usize,
    budget_exceeded: bool,
) -> Allocation {
    let mut allocations = Vec::new();
    let mut total_output_raw: u128 = 0;
    for (slot, &(path_index, _)) in curves.iter().enumerate() {
        if x[slot] == 0 {
            continue;
        }
        let output_raw = curves[slot].1.output_at(x[slot]);
        total_output_raw = total_output_raw.saturating_add(output_raw);
        allocations.push(PathAllocation {
            path_index,
            input_raw: x[slot],
            output_raw,
            initial_marginal: curves[slot].1.samples.first().map(|s| s.marginal_raw).unwrap_or(0.0),
            final_marginal: curves[slot].1.marginal_at(x[slot]),
        });
    }

    Allocation {
        allocations,
        total_input_raw,
        total_output_raw,
        iterations,
        budget_exceeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{build_graph, PoolRecord, TokenRecord};
    use crate::graph::pool::PoolVariant;
    use crate::graph::Graph;
    use crate::routing::curve::build_response_curve;
    use crate::routing::path::Path;
    use crate::utils::types::address_from_u64;

    fn two_parallel_pools() -> Graph {
        let reserves = [5_000_000_000u128, 1_000_000_000u128];
        let mut records = Vec::new();
        for (i, reserve) in reserves.iter().enumerate() {
            records.push(PoolRecord {
                pool_addr: [i as u8 + 1; 32],
                variant: PoolVariant::ConstantProduct,
                fee: 0.003,
                token_a: TokenRecord {
                    addr: address_from_u64(0),
                    symbol: "A".into(),
                    decimals: 18,
                    reserve_raw: *reserve,
                },
                token_b: TokenRecord {
                    addr: address_from_u64(1),
                    symbol: "U".into(),
                    decimals: 18,
                    reserve_raw: *reserve * 5,
                },
            });
        }
        build_graph(&records)
    }

    #[test]
    fn test_hill_climb_sums_close_to_total() {
        let graph = two_parallel_pools();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let total_input: u128 = 300_000_000;
        let curves: Vec<(usize, _)> = graph
            .edges_from(source)
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let path = Path::from_edges(std::slice::from_ref(edge), edge.log_spot_price);
                (i, build_response_curve(&graph, &path, total_input, 0))
            })
            .collect();

        let allocation = hill_climb(&curves, total_input);
        let sum: u128 = allocation.allocations.iter().map(|a| a.input_raw).sum();
        assert_eq!(sum, total_input);
    }

    #[test]
    fn test_hill_climb_splits_across_both_pools() {
        let graph = two_parallel_pools();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let total_input: u128 = 300_000_000;
        let curves: Vec<(usize, _)> = graph
            .edges_from(source)
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let path = Path::from_edges(std::slice::from_ref(edge), edge.log_spot_price);
                (i, build_response_curve(&graph, &path, total_input, 0))
            })
            .collect();

        let allocation = hill_climb(&curves, total_input);
        assert!(allocation.allocations.len() >= 2, "expected a split across pools of differing depth");
    }

    #[test]
    fn test_empty_curves_returns_empty_allocation() {
        let allocation = hill_climb(&[], 1_000);
        assert!(allocation.allocations.is_empty());
    }
}
