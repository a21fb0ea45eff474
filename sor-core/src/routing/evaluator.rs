use crate::graph::{Graph, PoolOracle};

use super::path::Path;

/// Chain `pool.swap` through a path's hops, short-circuiting to 0 on the
/// first zero-output hop (a broken edge).
pub fn simulate_route(graph: &Graph, path: &Path, amount_raw: u128) -> u128 {
    let mut amount = amount_raw;
    for hop in &path.hops {
        if amount == 0 {
            return 0;
        }
        let Some(pool) = graph.pool(hop.pool_id) else {
            return 0;
        };
        amount = pool.swap(amount, hop.from, hop.to);
    }
    amount
}

#[derive(Debug, Clone)]
pub struct BestSingle<'a> {
    pub path_index: usize,
    pub path: &'a Path,
    pub output_raw: u128,
    pub net_output_raw: u128,
}

/// `net = simulate - hops * gasPerHopOutRaw`, floored at zero; returns the
/// path with maximum net output, ties broken by discovery order (first
/// occurrence in `paths`).
pub fn select_best<'a>(
    graph: &Graph,
    paths: &'a [Path],
    amount_raw: u128,
    gas_per_hop_out_raw: u128,
) -> Option<BestSingle<'a>> {
    let mut best: Option<BestSingle<'a>> = None;
    for (index, path) in paths.iter().enumerate() {
        let output_raw = simulate_route(graph, path, amount_raw);
        let gas_raw = gas_per_hop_out_raw.saturating_mul(path.hop_count() as u128);
        let net_output_raw = output_raw.saturating_sub(gas_raw);

        let replace = match &best {
            None => true,
            Some(current) => net_output_raw > current.net_output_raw,
        };
        if replace {
            best = Some(BestSingle {
                path_index: index,
                path,
                output_raw,
                net_output_raw,
            });
        }
    }
    best
}
