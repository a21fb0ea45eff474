use crate::graph::Graph;
use crate::utils::math::clamp_finite_nonneg;
use crate::utils::types::CURVE_FRACTIONS;

use super::evaluator::simulate_route;
use super::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct CurveSample {
    pub input_raw: u128,
    pub output_raw: u128,
    pub marginal_raw: f64,
}

/// Sampled at the 18 canonical fractions of total input; output is net of
/// a per-hop gas charge and monotonized by flatlining at the first
/// regression (§4.6, open question on flatlining applies: this is a
/// conservative approximation, not true per-variant capacity modeling).
#[derive(Debug, Clone)]
pub struct ResponseCurve {
    pub samples: Vec<CurveSample>,
}

impl ResponseCurve {
    pub fn first_effective_rate(&self) -> f64 {
        self.samples
            .first()
            .filter(|s| s.input_raw > 0)
            .map(|s| s.output_raw as f64 / s.input_raw as f64)
            .unwrap_or(0.0)
    }

    /// Output at the given raw input, linearly interpolated between the
    /// two bracketing samples (or the nearest edge sample if out of range).
    pub fn output_at(&self, input_raw: u128) -> u128 {
        if self.samples.is_empty() {
            return 0;
        }
        if input_raw <= self.samples[0].input_raw {
            if self.samples[0].input_raw == 0 {
                return self.samples[0].output_raw;
            }
            let frac = input_raw as f64 / self.samples[0].input_raw as f64;
            return (self.samples[0].output_raw as f64 * frac) as u128;
        }
        for pair in self.samples.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if input_raw <= hi.input_raw {
                if hi.input_raw == lo.input_raw {
                    return hi.output_raw;
                }
                let t = (input_raw - lo.input_raw) as f64 / (hi.input_raw - lo.input_raw) as f64;
                let out = lo.output_raw as f64 + t * (hi.output_raw as f64 - lo.output_raw as f64);
                return out.max(0.0) as u128;
            }
        }
        self.samples.last().unwrap().output_raw
    }

    /// Marginal rate at the given raw input; used by the water-fill
    /// splitter's binary search.
    pub fn marginal_at(&self, input_raw: u128) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        for (i, sample) in self.samples.iter().enumerate() {
            if input_raw <= sample.input_raw {
                return self.samples[i].marginal_raw;
            }
        }
        self.samples.last().unwrap().marginal_raw
    }

    pub fn cap_raw(&self) -> u128 {
        self.samples.last().map(|s| s.input_raw).unwrap_or(0)
    }
}

pub fn build_response_curve(
    graph: &Graph,
    path: &Path,
    total_input_raw: u128,
    gas_per_hop_out_raw: u128,
) -> ResponseCurve {
    let mut samples = Vec::with_capacity(CURVE_FRACTIONS.len());
    let mut previous_output: Option<u128> = None;

    for &fraction in CURVE_FRACTIONS.iter() {
        let input_raw = ((total_input_raw as f64) * fraction) as u128;
        if input_raw == 0 {
            continue;
        }
        let input_raw = input_raw.min(path.cap_raw);

        let gas_raw = gas_per_hop_out_raw.saturating_mul(path.hop_count() as u128);
        let raw_output = simulate_route(graph, path, input_raw).saturating_sub(gas_raw);
        let mut output_raw = raw_output;

        if let Some(prev) = previous_output {
            if output_raw < prev {
                output_raw = prev;
                let marginal = marginal_for(&samples, input_raw, output_raw);
                samples.push(CurveSample {
                    input_raw,
                    output_raw,
                    marginal_raw: marginal,
                });
                break;
            }
        }

        let marginal = marginal_for(&samples, input_raw, output_raw);
        samples.push(CurveSample {
            input_raw,
            output_raw,
            marginal_raw: marginal,
        });
        previous_output = Some(output_raw);

        if input_raw >= path.cap_raw {
            break;
        }
    }

    ResponseCurve { samples }
}

fn marginal_for(samples: &[CurveSample], input_raw: u128, output_raw: u128) -> f64 {
    let marginal = match samples.last() {
        None => {
            if input_raw == 0 {
                0.0
            } else {
                output_raw as f64 / input_raw as f64
            }
        }
        Some(prev) => {
            let dx = input_raw as f64 - prev.input_raw as f64;
            if dx <= 0.0 {
                0.0
            } else {
                (output_raw as f64 - prev.output_raw as f64) / dx
            }
        }
    };
    clamp_finite_nonneg(marginal)
}

/// Optional quality gate: drop paths whose first-sample effective rate is
/// below `min_initial_eff_ratio` of the best such rate across all curves.
pub fn filter_by_initial_efficiency(
    curves: Vec<(usize, ResponseCurve)>,
    min_initial_eff_ratio: f64,
) -> Vec<(usize, ResponseCurve)> {
    if min_initial_eff_ratio <= 0.0 || curves.is_empty() {
        return curves;
    }
    let best_rate = curves
        .iter()
        .map(|(_, c)| c.first_effective_rate())
        .fold(0.0_f64, f64::max);
    if best_rate <= 0.0 {
        return curves;
    }
    let threshold = best_rate * min_initial_eff_ratio;
    curves
        .into_iter()
        .filter(|(_, c)| c.first_effective_rate() >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{build_graph, PoolRecord, TokenRecord};
    use crate::graph::pool::PoolVariant;
    use crate::routing::path::Path;
    use crate::utils::types::address_from_u64;

    fn cp_graph() -> Graph {
        let records = vec![PoolRecord {
            pool_addr: [1u8; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: TokenRecord {
                addr: address_from_u64(0),
                symbol: "A".into(),
                decimals: 18,
                reserve_raw: 1_000_000_000_000,
            },
            token_b: TokenRecord {
                addr: address_from_u64(1),
                symbol: "B".into(),
                decimals: 18,
                reserve_raw: 1_000_000_000_000,
            },
        }];
        build_graph(&records)
    }

    #[test]
    fn test_curve_monotone_nondecreasing() {
        let graph = cp_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let edges = graph.edges_from(source);
        let path = Path::from_edges(&edges, 0.0);
        let curve = build_response_curve(&graph, &path, 100_000_000_000, 0);
        for pair in curve.samples.windows(2) {
            assert!(pair[1].output_raw >= pair[0].output_raw);
        }
    }

    #[test]
    fn test_curve_marginals_finite_nonnegative() {
        let graph = cp_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let edges = graph.edges_from(source);
        let path = Path::from_edges(&edges, 0.0);
        let curve = build_response_curve(&graph, &path, 100_000_000_000, 0);
        for sample in &curve.samples {
            assert!(sample.marginal_raw.is_finite());
            assert!(sample.marginal_raw >= 0.0);
        }
    }

    #[test]
    fn test_filter_by_initial_efficiency_no_filter_when_zero() {
        let graph = cp_graph();
        let source = graph.token_id(address_from_u64(0)).unwrap();
        let edges = graph.edges_from(source);
        let path = Path::from_edges(&edges, 0.0);
        let curve = build_response_curve(&graph, &path, 100_000_000_000, 0);
        let curves = vec![(0, curve)];
        let filtered = filter_by_initial_efficiency(curves.clone(), 0.0);
        assert_eq!(filtered.len(), curves.len());
    }
}
