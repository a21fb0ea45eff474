use serde::{Deserialize, Serialize};

use crate::utils::math;

/// One side of a pool's two-token reserve pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolTokenSlot {
    pub token_id: usize,
    pub reserve_raw: u128,
}

/// Per-variant parameters. Each variant owns its own swap math; the core
/// never reaches past `PoolOracle` into these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolVariant {
    ConstantProduct,
    Concentrated {
        liquidity: u128,
        sqrt_price_x96: alloy_primitives::U256,
        tick: i32,
        tick_spacing: i32,
    },
    Stable {
        amplification: f64,
    },
}

/// A pool: two token slots, a fee, and a variant determining swap math.
///
/// Implementations are deterministic and pure with respect to the current
/// reserve snapshot; the router never mutates a pool through this trait —
/// only the graph dispatcher rewrites `slots` in place between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub pool_id: [u8; 32],
    pub variant: PoolVariant,
    pub fee: f64,
    pub slots: [PoolTokenSlot; 2],
}

impl Pool {
    pub fn new(pool_id: [u8; 32], variant: PoolVariant, fee: f64, slots: [PoolTokenSlot; 2]) -> Self {
        Self {
            pool_id,
            variant,
            fee,
            slots,
        }
    }

    fn slot(&self, token_id: usize) -> Option<&PoolTokenSlot> {
        self.slots.iter().find(|s| s.token_id == token_id)
    }

    pub fn other_token(&self, token_id: usize) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.token_id != token_id)
            .map(|s| s.token_id)
    }

    pub fn contains_token(&self, token_id: usize) -> bool {
        self.slots.iter().any(|s| s.token_id == token_id)
    }
}

/// The capability set every pool implementation must provide per spec: an
/// instantaneous rate oracle and a discrete swap oracle, plus token slot
/// introspection for the graph builder.
pub trait PoolOracle {
    /// Instantaneous marginal rate of `to` per unit `from`, after fee.
    /// Returns 0 if either reserve is 0 (edge absent).
    fn spot_price(&self, from: usize, to: usize) -> f64;

    /// Output for a discrete input. Returns 0 on a broken path (zero
    /// reserve). Must remain non-negative and finite even when `amount_in`
    /// exceeds the pool's liquidity.
    fn swap(&self, amount_in_raw: u128, from: usize, to: usize) -> u128;

    fn token_slot(&self, token_id: usize) -> Option<PoolTokenSlot>;
}

impl PoolOracle for Pool {
    fn spot_price(&self, from: usize, to: usize) -> f64 {
        let (Some(slot_in), Some(slot_out)) = (self.slot(from), self.slot(to)) else {
            return 0.0;
        };
        if slot_in.reserve_raw == 0 || slot_out.reserve_raw == 0 {
            return 0.0;
        }
        let reserve_in = alloy_primitives::U256::from(slot_in.reserve_raw);
        let reserve_out = alloy_primitives::U256::from(slot_out.reserve_raw);

        match &self.variant {
            PoolVariant::ConstantProduct => {
                math::constant_product_spot_price(reserve_in, reserve_out, self.fee)
            }
            PoolVariant::Concentrated { .. } => {
                // Spot price for a CLMM is derived from sqrtPriceX96, not
                // reserves; the reserve-based constant-product estimate is
                // used as a stand-in since the core treats this as an
                // external collaborator's precise math.
                math::constant_product_spot_price(reserve_in, reserve_out, self.fee)
            }
            PoolVariant::Stable { .. } => {
                math::stable_spot_price(reserve_in, reserve_out, self.fee)
            }
        }
    }

    fn swap(&self, amount_in_raw: u128, from: usize, to: usize) -> u128 {
        let (Some(slot_in), Some(slot_out)) = (self.slot(from), self.slot(to)) else {
            return 0;
        };
        if slot_in.reserve_raw == 0 || slot_out.reserve_raw == 0 || amount_in_raw == 0 {
            return 0;
        }
        let reserve_in = alloy_primitives::U256::from(slot_in.reserve_raw);
        let reserve_out = alloy_primitives::U256::from(slot_out.reserve_raw);
        let amount_in = alloy_primitives::U256::from(amount_in_raw);

        let out = match &self.variant {
            PoolVariant::ConstantProduct => {
                math::constant_product_swap_out(reserve_in, reserve_out, amount_in, self.fee)
            }
            PoolVariant::Concentrated { liquidity, sqrt_price_x96, .. } => {
                let fee_pips = (self.fee.clamp(0.0, 0.999_999) * 1_000_000.0).round() as u32;
                let target = if *sqrt_price_x96 > (alloy_primitives::U256::from(1u128) << 96) {
                    alloy_primitives::U256::ZERO
                } else {
                    alloy_primitives::U256::from(1u128) << 160
                };
                let step =
                    math::compute_swap_step(*sqrt_price_x96, target, *liquidity, amount_in, fee_pips);
                step.amount_out.min(reserve_out)
            }
            PoolVariant::Stable { amplification } => {
                math::stable_swap_out(reserve_in, reserve_out, amount_in, self.fee, *amplification)
            }
        };
        crate::utils::types::u256_ext::to_f64(out).min(u128::MAX as f64).max(0.0) as u128
    }

    fn token_slot(&self, token_id: usize) -> Option<PoolTokenSlot> {
        self.slot(token_id).copied()
    }
}
