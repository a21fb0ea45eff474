use std::time::Instant;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::cache::HeuristicCache;
use crate::graph::Graph;
use crate::utils::types::{
    is_recognized_stablecoin, DEFAULT_BEAM_WIDTH, DEFAULT_GAS_PER_HOP_USD,
    DEFAULT_MAX_HOPS, DEFAULT_MIN_INITIAL_EFF_RATIO, DEFAULT_STEP_COUNT, DEFAULT_TOP_K,
    MAX_HOPS_BITWIDTH, RECOMMENDED_MAX_HOPS,
};
use crate::utils::{Result, RouterError};

use super::astar::find_top_k_routes_with_penalty;
use super::curve::build_response_curve;
use super::evaluator::select_best;
use super::hillclimb::hill_climb;
use super::path::Path;
use super::waterfill::water_fill;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub max_hops: usize,
    pub top_k: usize,
    pub beam_width: usize,
    pub gas_per_hop_usd: f64,
    /// Required for non-stablecoin targets; recognized stablecoins default
    /// to 1.0 when omitted (open question resolution, see DESIGN.md).
    pub target_usd_price: Option<f64>,
    pub enable_splitting: bool,
    pub min_initial_eff_ratio: f64,
    pub step_count: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            top_k: DEFAULT_TOP_K,
            beam_width: DEFAULT_BEAM_WIDTH,
            gas_per_hop_usd: DEFAULT_GAS_PER_HOP_USD,
            target_usd_price: None,
            enable_splitting: false,
            min_initial_eff_ratio: DEFAULT_MIN_INITIAL_EFF_RATIO,
            step_count: DEFAULT_STEP_COUNT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub source_addr: Address,
    pub target_addr: Address,
    pub swap_amount_human: f64,
    pub config: RoutingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathHopOutput {
    pub pool_addr: [u8; 32],
    pub from_addr: Address,
    pub to_addr: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathOutput {
    pub hops: Vec<PathHopOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestSingleOutput {
    pub path_index: usize,
    pub output_human: f64,
    pub output_raw: u128,
    pub gas_cost_raw: u128,
    pub net_output_human: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathAllocationOutput {
    pub path_index: usize,
    pub input_human: f64,
    pub output_human: f64,
    pub initial_marginal: f64,
    pub final_marginal: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SplitAlgorithm {
    Waterfill,
    Hillclimb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOutput {
    pub total_input_human: f64,
    pub total_output_human: f64,
    pub allocations: Vec<PathAllocationOutput>,
    pub iterations: usize,
    pub algorithm: SplitAlgorithm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub heuristic_build_ms: f64,
    pub astar_ms: f64,
    pub evaluator_ms: f64,
    pub splitter_ms: f64,
    pub nodes_explored: usize,
    pub astar_budget_exceeded: bool,
    pub splitter_budget_exceeded: bool,
    pub no_route_found: bool,
    pub splitter_disagreement: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub paths: Vec<PathOutput>,
    pub best_single: Option<BestSingleOutput>,
    pub split: Option<SplitOutput>,
    pub diagnostics: Diagnostics,
}

/// Orchestrates graph → heuristic → A* → evaluator → curve builder →
/// splitter for one quote request. Holds the graph and the heuristic
/// cache; stateless otherwise, so it is cheap to share behind an `Arc`
/// across request handlers.
pub struct Quoter {
    graph: std::sync::Arc<Graph>,
    heuristic_cache: HeuristicCache,
}

impl Quoter {
    pub fn new(graph: std::sync::Arc<Graph>) -> Self {
        Self {
            graph,
            heuristic_cache: HeuristicCache::default(),
        }
    }

    #[tracing::instrument(skip(self, request), fields(swap_amount = request.swap_amount_human))]
    pub fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse> {
        let config = &request.config;
        if config.max_hops == 0 {
            return Err(RouterError::InputInvalid("max_hops must be positive".into()));
        }
        if config.max_hops >= MAX_HOPS_BITWIDTH {
            return Err(RouterError::InputInvalid(format!(
                "max_hops {} exceeds the visited-bitset width ({})",
                config.max_hops,
                MAX_HOPS_BITWIDTH - 1
            )));
        }
        // Anything above the recommended deployment ceiling is clamped down
        // rather than rejected outright, since a generous max_hops is a
        // common client default rather than a deliberate request for an
        // unbounded search.
        let max_hops = config.max_hops.min(RECOMMENDED_MAX_HOPS);
        if request.swap_amount_human <= 0.0 {
            return Err(RouterError::InputInvalid("swap_amount must be positive".into()));
        }

        let source = self.graph.token_id(request.source_addr).ok_or_else(|| {
            RouterError::InputInvalid(format!("unknown source token {}", request.source_addr))
        })?;
        let target = self.graph.token_id(request.target_addr).ok_or_else(|| {
            RouterError::InputInvalid(format!("unknown target token {}", request.target_addr))
        })?;

        let target_token = self
            .graph
            .token(target)
            .ok_or_else(|| RouterError::InternalError("target token vanished from graph".into()))?;
        let target_usd_price = match config.target_usd_price {
            Some(price) if price > 0.0 => price,
            Some(_) => {
                return Err(RouterError::InputInvalid(
                    "target_usd_price must be positive".into(),
                ))
            }
            None if is_recognized_stablecoin(&target_token.symbol) => 1.0,
            None => {
                return Err(RouterError::InputInvalid(
                    "target_usd_price is required for non-stablecoin targets".into(),
                ))
            }
        };

        let source_token = self
            .graph
            .token(source)
            .ok_or_else(|| RouterError::InternalError("source token vanished from graph".into()))?;
        let amount_raw = source_token.to_raw(request.swap_amount_human);

        // gasPerHopPenalty for the log-space search is the USD gas cost
        // normalized by the target's USD price: a dimensionless per-hop
        // additive penalty comparable in scale to logSpotPrice.
        let gas_per_hop_penalty = config.gas_per_hop_usd / target_usd_price;
        let gas_per_hop_out_raw = ((config.gas_per_hop_usd / target_usd_price)
            * 10f64.powi(target_token.decimals as i32)) as u128;

        let mut diagnostics = Diagnostics::default();

        let t0 = Instant::now();
        let heuristic = self
            .heuristic_cache
            .get_or_build(&self.graph, target, gas_per_hop_penalty);
        diagnostics.heuristic_build_ms = t0.elapsed().as_secs_f64() * 1000.0;
        if heuristic.budget_exceeded {
            tracing::warn!(target = target, "heuristic build exceeded its iteration budget");
        }

        let t1 = Instant::now();
        let astar_result = find_top_k_routes_with_penalty(
            &self.graph,
            &heuristic,
            source,
            target,
            max_hops,
            config.top_k,
            config.beam_width,
            gas_per_hop_penalty,
        );
        diagnostics.astar_ms = t1.elapsed().as_secs_f64() * 1000.0;
        diagnostics.nodes_explored = astar_result.nodes_explored;
        diagnostics.astar_budget_exceeded = astar_result.budget_exceeded;
        if astar_result.budget_exceeded {
            tracing::warn!(source, target, "A* search exceeded its iteration/time budget");
        }

        let paths = astar_result.paths;
        if paths.is_empty() {
            diagnostics.no_route_found = true;
            return Ok(QuoteResponse {
                paths: Vec::new(),
                best_single: None,
                split: None,
                diagnostics,
            });
        }

        let t2 = Instant::now();
        let best_single = select_best(&self.graph, &paths, amount_raw, gas_per_hop_out_raw).map(|best| {
            BestSingleOutput {
                path_index: best.path_index,
                output_human: target_token.to_human(best.output_raw),
                output_raw: best.output_raw,
                gas_cost_raw: best.output_raw.saturating_sub(best.net_output_raw),
                net_output_human: target_token.to_human(best.net_output_raw),
            }
        });
        diagnostics.evaluator_ms = t2.elapsed().as_secs_f64() * 1000.0;

        let split = if config.enable_splitting {
            let t3 = Instant::now();
            let split = self.run_split(&paths, amount_raw, gas_per_hop_out_raw, &target_token, &mut diagnostics);
            diagnostics.splitter_ms = t3.elapsed().as_secs_f64() * 1000.0;
            split
        } else {
            None
        };

        let path_outputs = paths
            .iter()
            .map(|p| PathOutput {
                hops: p
                    .hops
                    .iter()
                    .map(|h| PathHopOutput {
                        pool_addr: self
                            .graph
                            .pool(h.pool_id)
                            .map(|pool| pool.pool_id)
                            .unwrap_or([0u8; 32]),
                        from_addr: self.graph.token(h.from).map(|t| t.addr).unwrap_or_default(),
                        to_addr: self.graph.token(h.to).map(|t| t.addr).unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();

        Ok(QuoteResponse {
            paths: path_outputs,
            best_single,
            split,
            diagnostics,
        })
    }

    fn run_split(
        &self,
        paths: &[Path],
        amount_raw: u128,
        gas_per_hop_out_raw: u128,
        target_token: &crate::graph::Token,
        diagnostics: &mut Diagnostics,
    ) -> Option<SplitOutput> {
        // Candidate paths are independent of one another; sampling their
        // response curves is the one piece of the splitter that parallelizes
        // cleanly (water-fill itself is a cross-path iterative equilibration
        // and stays single-threaded).
        use rayon::prelude::*;
        let curves: Vec<(usize, _)> = paths
            .par_iter()
            .enumerate()
            .map(|(i, path)| (i, build_response_curve(&self.graph, path, amount_raw, gas_per_hop_out_raw)))
            .collect();

        let waterfill_result = water_fill(&curves, amount_raw);
        diagnostics.splitter_budget_exceeded = waterfill_result.budget_exceeded;
        if waterfill_result.budget_exceeded {
            tracing::warn!("water-fill splitter exceeded its iteration budget");
        }

        #[cfg(any(debug_assertions, test))]
        {
            let hillclimb_result = hill_climb(&curves, amount_raw);
            let diff = (waterfill_result.total_output_raw as f64 - hillclimb_result.total_output_raw as f64).abs();
            let tol = (waterfill_result.total_output_raw as f64 * 0.01).max(1.0);
            if diff > tol {
                diagnostics.splitter_disagreement = Some(diff);
                tracing::warn!(
                    waterfill_output = waterfill_result.total_output_raw,
                    hillclimb_output = hillclimb_result.total_output_raw,
                    "water-fill and hill-climb splitters disagree beyond tolerance"
                );
            }
        }

        if waterfill_result.allocations.is_empty() {
            return None;
        }

        Some(SplitOutput {
            total_input_human: target_token.to_human(waterfill_result.total_input_raw),
            total_output_human: target_token.to_human(waterfill_result.total_output_raw),
            allocations: waterfill_result
                .allocations
                .iter()
                .map(|a| PathAllocationOutput {
                    path_index: a.path_index,
                    input_human: target_token.to_human(a.input_raw),
                    output_human: target_token.to_human(a.output_raw),
                    initial_marginal: a.initial_marginal,
                    final_marginal: a.final_marginal,
                })
                .collect(),
            iterations: waterfill_result.iterations,
            algorithm: SplitAlgorithm::Waterfill,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{build_graph, PoolRecord, TokenRecord};
    use crate::graph::pool::PoolVariant;
    use crate::utils::types::address_from_u64;

    fn single_pool_graph() -> Graph {
        let records = vec![PoolRecord {
            pool_addr: [1u8; 32],
            variant: PoolVariant::ConstantProduct,
            fee: 0.003,
            token_a: TokenRecord {
                addr: address_from_u64(0),
                symbol: "A".into(),
                decimals: 8,
                reserve_raw: 5_000_000_000,
            },
            token_b: TokenRecord {
                addr: address_from_u64(1),
                symbol: "USDC".into(),
                decimals: 6,
                reserve_raw: 25_000_000_000,
            },
        }];
        build_graph(&records)
    }

    #[test]
    fn test_s1_single_hop_full_capacity() {
        let graph = std::sync::Arc::new(single_pool_graph());
        let quoter = Quoter::new(graph);
        let request = QuoteRequest {
            source_addr: address_from_u64(0),
            target_addr: address_from_u64(1),
            swap_amount_human: 10.0,
            config: RoutingConfig {
                max_hops: 1,
                top_k: 1,
                gas_per_hop_usd: 0.01,
                enable_splitting: false,
                ..RoutingConfig::default()
            },
        };
        let response = quoter.quote(&request).unwrap();
        assert_eq!(response.paths.len(), 1);
        let best = response.best_single.unwrap();
        assert!((best.net_output_human - 4161.2).abs() / 4161.2 < 1e-2);
    }

    #[test]
    fn test_unknown_source_is_input_invalid() {
        let graph = std::sync::Arc::new(single_pool_graph());
        let quoter = Quoter::new(graph);
        let request = QuoteRequest {
            source_addr: address_from_u64(99),
            target_addr: address_from_u64(1),
            swap_amount_human: 10.0,
            config: RoutingConfig::default(),
        };
        assert!(matches!(quoter.quote(&request), Err(RouterError::InputInvalid(_))));
    }

    #[test]
    fn test_non_stablecoin_target_requires_explicit_price() {
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
                symbol: "WETH".into(),
                decimals: 18,
                reserve_raw: 1_000_000_000_000,
            },
        }];
        let graph = std::sync::Arc::new(build_graph(&records));
        let quoter = Quoter::new(graph);
        let request = QuoteRequest {
            source_addr: address_from_u64(0),
            target_addr: address_from_u64(1),
            swap_amount_human: 1.0,
            config: RoutingConfig::default(),
        };
        assert!(matches!(quoter.quote(&request), Err(RouterError::InputInvalid(_))));
    }

    #[test]
    fn test_zero_max_hops_is_input_invalid() {
        let graph = std::sync::Arc::new(single_pool_graph());
        let quoter = Quoter::new(graph);
        let request = QuoteRequest {
            source_addr: address_from_u64(0),
            target_addr: address_from_u64(1),
            swap_amount_human: 10.0,
            config: RoutingConfig {
                max_hops: 0,
                ..RoutingConfig::default()
            },
        };
        assert!(matches!(quoter.quote(&request), Err(RouterError::InputInvalid(_))));
    }

    #[test]
    fn test_max_hops_above_bitset_width_is_input_invalid() {
        let graph = std::sync::Arc::new(single_pool_graph());
        let quoter = Quoter::new(graph);
        let request = QuoteRequest {
            source_addr: address_from_u64(0),
            target_addr: address_from_u64(1),
            swap_amount_human: 10.0,
            config: RoutingConfig {
                max_hops: MAX_HOPS_BITWIDTH,
                ..RoutingConfig::default()
            },
        };
        assert!(matches!(quoter.quote(&request), Err(RouterError::InputInvalid(_))));
    }

    #[test]
    fn test_max_hops_above_recommended_ceiling_is_clamped_not_rejected() {
        let graph = std::sync::Arc::new(single_pool_graph());
        let quoter = Quoter::new(graph);
        let request = QuoteRequest {
            source_addr: address_from_u64(0),
            target_addr: address_from_u64(1),
            swap_amount_human: 10.0,
            config: RoutingConfig {
                max_hops: RECOMMENDED_MAX_HOPS + 10,
                top_k: 1,
                enable_splitting: false,
                ..RoutingConfig::default()
            },
        };
        assert!(quoter.quote(&request).is_ok());
    }
}
