use serde::{Deserialize, Serialize};

use crate::utils::types::PoolId;

/// A large sentinel used as `dx_cap_raw` when a hop is uncapped.
pub const CAP_SENTINEL: u128 = u128::MAX / 2;

/// A directed adjacency entry `from -> to` across one pool.
///
/// `score` exists only to rank parallel edges during compression; it is
/// never used as the A* path cost (that uses `log_spot_price` directly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub pool_id: PoolId,
    pub from: usize,
    pub to: usize,
    pub spot_price: f64,
    pub log_spot_price: f64,
    pub liquidity_score: f64,
    pub score: f64,
    pub dx_cap_raw: u128,
}

impl GraphEdge {
    pub fn new(
        pool_id: PoolId,
        from: usize,
        to: usize,
        spot_price: f64,
        liquidity_score: f64,
        dx_cap_raw: u128,
    ) -> Self {
        let log_spot_price = crate::utils::math::log_spot_price(spot_price);
        let score = log_spot_price + (liquidity_score + 1e-9).ln();
        Self {
            pool_id,
            from,
            to,
            spot_price,
            log_spot_price,
            liquidity_score,
            score,
            dx_cap_raw,
        }
    }
}
