use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::routing::RoutingConfig;

/// `GET /v1/quote` query params, per the external interface's `QuoteRequest`
/// shape: required source/target/amount plus the `RoutingConfig` fields as
/// optional overrides with the spec's stated defaults.
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub token_in: Address,
    pub token_out: Address,
    /// Decimal string, human-readable units of the source token.
    pub amount_in: String,
    pub max_hops: Option<usize>,
    pub top_k: Option<usize>,
    pub beam_width: Option<usize>,
    pub gas_per_hop_usd: Option<f64>,
    pub target_usd_price: Option<f64>,
    #[serde(default)]
    pub enable_splitting: bool,
    pub min_initial_eff_ratio: Option<f64>,
    pub step_count: Option<usize>,
}

impl QuoteQuery {
    pub fn into_routing_config(self) -> RoutingConfig {
        let defaults = RoutingConfig::default();
        RoutingConfig {
            max_hops: self.max_hops.unwrap_or(defaults.max_hops),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            beam_width: self.beam_width.unwrap_or(defaults.beam_width),
            gas_per_hop_usd: self.gas_per_hop_usd.unwrap_or(defaults.gas_per_hop_usd),
            target_usd_price: self.target_usd_price,
            enable_splitting: self.enable_splitting,
            min_initial_eff_ratio: self
                .min_initial_eff_ratio
                .unwrap_or(defaults.min_initial_eff_ratio),
            step_count: self.step_count.unwrap_or(defaults.step_count),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteApiResponse {
    pub request_id: uuid::Uuid,
    #[serde(flatten)]
    pub quote: crate::routing::QuoteResponse,
    pub timestamp: u64,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub graph_stats: GraphStatsDto,
}

#[derive(Debug, Serialize)]
pub struct GraphStatsDto {
    pub token_count: usize,
    pub pool_count: usize,
    pub last_update: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
