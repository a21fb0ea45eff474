use super::curve::ResponseCurve;

const MAX_ITER: usize = 5_000;
const BINARY_SEARCH_STEPS: usize = 60;
const DUST_FRACTION: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct PathAllocation {
    pub path_index: usize,
    pub input_raw: u128,
    pub output_raw: u128,
    pub initial_marginal: f64,
    pub final_marginal: f64,
}

#[derive(Debug, Clone)]
pub struct Allocation {
    pub allocations: Vec<PathAllocation>,
    pub total_input_raw: u128,
    pub total_output_raw: u128,
    pub iterations: usize,
    pub budget_exceeded: bool,
}

/// Priority-queue water-fill: raises the allocation on the currently
/// best-marginal path(s) until they meet the next-best path's initial
/// marginal, repeating until the total input is exhausted. See spec 4.7.
pub fn water_fill(curves: &[(usize, ResponseCurve)], total_input_raw: u128) -> Allocation {
    let total = total_input_raw as f64;
    let tol = (total * 1e-12).max(1e-9);

    let mut x = vec![0.0_f64; curves.len()];
    let initial_marginal: Vec<f64> = curves
        .iter()
        .map(|(_, c)| c.samples.first().map(|s| s.marginal_raw).unwrap_or(0.0))
        .collect();
    let caps: Vec<f64> = curves.iter().map(|(_, c)| c.cap_raw() as f64).collect();

    let mut sorted: Vec<usize> = (0..curves.len())
        .filter(|&i| caps[i] > 0.0 && initial_marginal[i] > 0.0)
        .collect();
    sorted.sort_by(|&a, &b| {
        initial_marginal[b]
            .partial_cmp(&initial_marginal[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut active: Vec<usize> = Vec::new();
    let mut pointer = 0usize;
    let mut remaining = total;
    let mut iterations = 0usize;
    let mut budget_exceeded = false;

    if !sorted.is_empty() {
        active.push(sorted[pointer]);
        pointer += 1;
    }

    while remaining > tol {
        iterations += 1;
        if iterations > MAX_ITER {
            budget_exceeded = true;
            break;
        }
        if active.is_empty() {
            if pointer < sorted.len() {
                active.push(sorted[pointer]);
                pointer += 1;
                continue;
            } else {
                break;
            }
        }

        let current_level = active
            .iter()
            .map(|&i| curves[i].1.marginal_at(x[i] as u128))
            .fold(0.0_f64, f64::max);
        let target_level = if pointer < sorted.len() {
            initial_marginal[sorted[pointer]]
        } else {
            0.0
        };

        let deltas = compute_deltas(curves, &x, &caps, &active, target_level);
        let sum_deltas: f64 = deltas.iter().sum();
        let all_within_cap = active
            .iter()
            .zip(deltas.iter())
            .all(|(&i, &d)| x[i] + d <= caps[i] + tol);

        if sum_deltas <= remaining + tol && all_within_cap {
            for (&i, &d) in active.iter().zip(deltas.iter()) {
                x[i] += d;
            }
            remaining -= sum_deltas.min(remaining);
            if remaining <= tol {
                break;
            }
            if pointer < sorted.len() && target_level >= current_level - tol {
                // target reached with budget left: bring in the next path.
            }
            sweep_active(curves, &mut active, &x, &caps);
            if pointer < sorted.len() {
                active.push(sorted[pointer]);
                pointer += 1;
            }
        } else {
            let level = binary_search_level(curves, &x, &caps, &active, target_level, current_level, remaining);
            let deltas = compute_deltas(curves, &x, &caps, &active, level);
            let sum: f64 = deltas.iter().sum();
            let scale = if sum > 0.0 { (remaining / sum).min(1.0) } else { 0.0 };
            for (&i, &d) in active.iter().zip(deltas.iter()) {
                x[i] += d * scale;
            }
            remaining -= (sum * scale).min(remaining);
            sweep_active(curves, &mut active, &x, &caps);
            break;
        }
    }

    normalize(&mut x, &caps, total);
    finalize(curves, x, initial_marginal, total_input_raw, iterations, budget_exceeded)
}

fn compute_deltas(
    curves: &[(usize, ResponseCurve)],
    x: &[f64],
    caps: &[f64],
    active: &[usize],
    target_level: f64,
) -> Vec<f64> {
    active
        .iter()
        .map(|&i| {
            let x_next = solve_for_target_marginal(&curves[i].1, x[i], caps[i], target_level);
            (x_next - x[i]).max(0.0)
        })
        .collect()
}

fn solve_for_target_marginal(curve: &ResponseCurve, lo: f64, hi: f64, target: f64) -> f64 {
    if hi <= lo {
        return lo;
    }
    if curve.marginal_at(hi as u128) > target {
        return hi;
    }
    let mut lo = lo;
    let mut hi = hi;
    for _ in 0..BINARY_SEARCH_STEPS {
        let mid = lo + (hi - lo) / 2.0;
        if curve.marginal_at(mid as u128) > target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

fn binary_search_level(
    curves: &[(usize, ResponseCurve)],
    x: &[f64],
    caps: &[f64],
    active: &[usize],
    target_level: f64,
    current_level: f64,
    remaining: f64,
) -> f64 {
    let mut lo = target_level;
    let mut hi = current_level;
    for _ in 0..BINARY_SEARCH_STEPS {
        let mid = lo + (hi - lo) / 2.0;
        let deltas = compute_deltas(curves, x, caps, active, mid);
        let sum: f64 = deltas.iter().sum();
        if sum > remaining {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

fn sweep_active(curves: &[(usize, ResponseCurve)], active: &mut Vec<usize>, x: &[f64], caps: &[f64]) {
    active.retain(|&i| {
        let saturated = x[i] >= caps[i] - 1e-6;
        let zero_marginal = curves[i].1.marginal_at(x[i] as u128) <= 0.0;
        !saturated && !zero_marginal
    });
}

fn normalize(x: &mut [f64], caps: &[f64], total: f64) {
    let sum: f64 = x.iter().sum();
    let tol = (total * 1e-9).max(1e-6);
    if (sum - total).abs() <= tol {
        let has_dust = x.iter().any(|&v| v > 0.0 && v < total * DUST_FRACTION);
        if !has_dust {
            return;
        }
    }

    if let Some(largest_idx) = (0..x.len()).max_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(std::cmp::Ordering::Equal)) {
        let dust_threshold = total * DUST_FRACTION;
        let mut dust_sum = 0.0;
        for i in 0..x.len() {
            if i != largest_idx && x[i] > 0.0 && x[i] < dust_threshold {
                dust_sum += x[i];
                x[i] = 0.0;
            }
        }
        x[largest_idx] += dust_sum;
    }

    let sum: f64 = x.iter().sum();
    if sum > 0.0 {
        let scale = total / sum;
        for (i, v) in x.iter_mut().enumerate() {
            *v = (*v * scale).min(caps[i].max(*v));
        }
    }
}

fn finalize(
    curves: &[(usize, ResponseCurve)],
    x: Vec<f64>,
    initial_marginal: Vec<f64>,
    total_input_raw: u128,
    iterations: usize,
    budget_exceeded: bool,
) -> Allocation {
    let mut allocations = Vec::new();
    let mut total_output_raw: u128 = 0;
    for (slot, &(path_index, _)) in curves.iter().enumerate() {
        let input_raw = x[slot].max(0.0) as u128;
        if input_raw == 0 {
            continue;
        }
        let output_raw = curves[slot].1.output_at(input_raw);
        total_output_raw = total_output_raw.saturating_add(output_raw);
        allocations.push(PathAllocation {
            path_index,
            input_raw,
            output_raw,
            initial_marginal: initial_marginal[slot],
            final_marginal: curves[slot].1.marginal_at(input_raw),
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
    use crate::routing::curve::build_response_curve;
    use crate::routing::path::Path;
    use crate::utils::types::address_from_u64;

    fn three_parallel_pools() -> Graph {
        let reserves = [5_000_000_000u128, 3_000_000_000u128, 2_000_000_000u128];
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

    use crate::graph::Graph;

    #[test]
    fn test_allocation_sums_to_total_within_tolerance() {
        let graph = three_parallel_pools();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let total_input: u128 = 600_000_000;
        let curves: Vec<(usize, _)> = graph
            .edges_from(source)
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let path = Path::from_edges(std::slice::from_ref(edge), edge.log_spot_price);
                (i, build_response_curve(&graph, &path, total_input, 0))
            })
            .collect();

        let allocation = water_fill(&curves, total_input);
        let sum: u128 = allocation.allocations.iter().map(|a| a.input_raw).sum();
        let diff = (sum as i128 - total_input as i128).unsigned_abs();
        assert!(diff <= total_input.max(1) / 100, "sum {sum} vs total {total_input}");
    }

    #[test]
    fn test_single_path_degenerates_to_full_allocation() {
        let graph = three_parallel_pools();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let edges = graph.edges_from(source);
        let path = Path::from_edges(std::slice::from_ref(&edges[0]), edges[0].log_spot_price);
        let total_input: u128 = 100_000_000;
        let curve = build_response_curve(&graph, &path, total_input, 0);
        let curves = vec![(0usize, curve)];

        let allocation = water_fill(&curves, total_input);
        assert_eq!(allocation.allocations.len(), 1);
    }
}
