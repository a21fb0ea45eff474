use alloy_primitives::U256;

use crate::utils::types::u256_ext;

/// Apply a slippage tolerance (in basis points) to an amount, rounding down.
pub fn apply_slippage(amount: U256, slippage_bps: u32) -> U256 {
    let slippage = U256::from(slippage_bps.min(10_000));
    let basis_points = U256::from(10_000u32);
    amount * (basis_points - slippage) / basis_points
}

/// Natural log of a spot price, with the `+1e-9` floor from the spec so a
/// zero price never produces `-inf`.
pub fn log_spot_price(spot_price: f64) -> f64 {
    (spot_price + 1e-9).ln()
}

/// `sqrt(reserveIn * reserveOut)` computed in floating point; used only for
/// parallel-edge ranking (`GraphEdge::score`), never for swap correctness.
pub fn liquidity_score(reserve_in: U256, reserve_out: U256) -> f64 {
    let a = u256_ext::to_f64(reserve_in);
    let b = u256_ext::to_f64(reserve_out);
    (a * b).max(0.0).sqrt()
}

/// Replace non-finite or non-positive values with zero, per the
/// response-curve builder's "bad samples become 0" rule.
pub fn clamp_finite_nonneg(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Constant-product swap math (used by the ConstantProduct pool variant).
// ---------------------------------------------------------------------------

/// Output of a constant-product swap `x*y=k` after a proportional fee on the
/// input, rounded down. Returns zero if either reserve is zero.
pub fn constant_product_swap_out(
    reserve_in: U256,
    reserve_out: U256,
    amount_in: U256,
    fee: f64,
) -> U256 {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_in.is_zero() {
        return U256::ZERO;
    }
    let fee_bps = (fee.clamp(0.0, 0.999_999) * 1_000_000.0).round() as u64;
    let fee_denom = U256::from(1_000_000u64);
    let amount_in_less_fee = amount_in * U256::from(1_000_000u64 - fee_bps) / fee_denom;

    let numerator = amount_in_less_fee * reserve_out;
    let denominator = reserve_in + amount_in_less_fee;
    if denominator.is_zero() {
        return U256::ZERO;
    }
    numerator / denominator
}

/// Instantaneous marginal rate of `reserve_out`-token per unit
/// `reserve_in`-token for a constant-product pool, after fee.
pub fn constant_product_spot_price(reserve_in: U256, reserve_out: U256, fee: f64) -> f64 {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return 0.0;
    }
    let ri = u256_ext::to_f64(reserve_in);
    let ro = u256_ext::to_f64(reserve_out);
    if ri <= 0.0 {
        return 0.0;
    }
    (ro / ri) * (1.0 - fee)
}

// ---------------------------------------------------------------------------
// CLMM (Concentrated Liquidity) single-step swap math, used by the
// Concentrated pool variant. Mirrors Uniswap v3/v4's
// `SwapMath.computeSwapStep` over one tick range using Q64.96 fixed-point
// arithmetic; walking the tick bitmap across multiple ranges is out of
// scope, per-variant swap precision being an external collaborator concern.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SwapStepResult {
    pub sqrt_price_next: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// `2^96`, the fixed-point scale every sqrt-price in this module is carried
/// in. Pulled out to a helper since the teacher's version recomputed the
/// shift inline in every function.
fn q96() -> U256 {
    U256::from(1u128) << 96
}

/// Ceiling division, `(numerator + denominator - 1) / denominator`. Both
/// delta formulas below round up so a step never hands out more than the
/// curve allows; shared here instead of duplicated per delta direction.
fn ceil_div(numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    (numerator + denominator - U256::from(1u64)) / denominator
}

pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee_pips: u32,
) -> SwapStepResult {
    if amount_remaining.is_zero() || liquidity == 0 {
        return SwapStepResult {
            sqrt_price_next: sqrt_price_current,
            amount_in: U256::ZERO,
            amount_out: U256::ZERO,
            fee_amount: U256::ZERO,
        };
    }

    let token0_to_token1 = sqrt_price_current >= sqrt_price_target;
    let liq = U256::from(liquidity);
    let fee_denom = U256::from(1_000_000u64);
    let fee = U256::from(fee_pips);

    let amount_after_fee = amount_remaining * (fee_denom - fee) / fee_denom;

    let amount_in_to_reach_target = if token0_to_token1 {
        token0_delta(sqrt_price_target, sqrt_price_current, liq)
    } else {
        token1_delta(sqrt_price_current, sqrt_price_target, liq)
    };

    let reaches_target = amount_after_fee >= amount_in_to_reach_target;

    let (sqrt_price_next, amount_in, amount_out) = if reaches_target {
        let amount_out = if token0_to_token1 {
            token1_delta(sqrt_price_target, sqrt_price_current, liq)
        } else {
            token0_delta(sqrt_price_current, sqrt_price_target, liq)
        };
        (sqrt_price_target, amount_in_to_reach_target, amount_out)
    } else {
        let sqrt_price_next = if token0_to_token1 {
            next_sqrt_price_from_token0_input(sqrt_price_current, liq, amount_after_fee)
        } else {
            next_sqrt_price_from_token1_input(sqrt_price_current, liq, amount_after_fee)
        };

        let amount_in_actual = if token0_to_token1 {
            token0_delta(sqrt_price_next, sqrt_price_current, liq)
        } else {
            token1_delta(sqrt_price_current, sqrt_price_next, liq)
        };

        let amount_out = if token0_to_token1 {
            token1_delta(sqrt_price_next, sqrt_price_current, liq)
        } else {
            token0_delta(sqrt_price_current, sqrt_price_next, liq)
        };

        (sqrt_price_next, amount_in_actual, amount_out)
    };

    let fee_amount = if reaches_target {
        if fee_pips == 0 {
            U256::ZERO
        } else {
            amount_in * fee / (fee_denom - fee) + U256::from(1u64)
        }
    } else {
        amount_remaining - amount_in
    };

    SwapStepResult {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    }
}

/// `L * Q96 * (sqrtP_upper - sqrtP_lower) / (sqrtP_upper * sqrtP_lower)`, rounded up.
fn token0_delta(sqrt_price_lower: U256, sqrt_price_upper: U256, liquidity: U256) -> U256 {
    if sqrt_price_lower >= sqrt_price_upper || sqrt_price_lower.is_zero() {
        return U256::ZERO;
    }
    let numerator = liquidity * q96() * (sqrt_price_upper - sqrt_price_lower);
    let denominator = sqrt_price_upper * sqrt_price_lower;
    ceil_div(numerator, denominator)
}

/// `L * (sqrtP_upper - sqrtP_lower) / Q96`, rounded up.
fn token1_delta(sqrt_price_lower: U256, sqrt_price_upper: U256, liquidity: U256) -> U256 {
    if sqrt_price_lower >= sqrt_price_upper {
        return U256::ZERO;
    }
    ceil_div(liquidity * (sqrt_price_upper - sqrt_price_lower), q96())
}

fn next_sqrt_price_from_token0_input(sqrt_price: U256, liquidity: U256, amount: U256) -> U256 {
    if amount.is_zero() {
        return sqrt_price;
    }
    let numerator = liquidity * sqrt_price;
    let denominator = liquidity + amount * sqrt_price / q96();
    if denominator.is_zero() {
        return sqrt_price;
    }
    numerator / denominator
}

fn next_sqrt_price_from_token1_input(sqrt_price: U256, liquidity: U256, amount: U256) -> U256 {
    if liquidity.is_zero() {
        return sqrt_price;
    }
    sqrt_price + amount * q96() / liquidity
}

fn q96_f64() -> f64 {
    u256_ext::to_f64(q96())
}

/// `sqrtPrice = sqrt(1.0001^tick) * 2^96`, computed via floating point.
pub fn tick_to_sqrt_price_x96(tick: i32) -> U256 {
    let sqrt_ratio = (1.0001_f64).powf(tick as f64 / 2.0);
    let value = sqrt_ratio * q96_f64();
    if value <= 0.0 || !value.is_finite() {
        return q96();
    }
    u256_ext::from_f64(value)
}

pub fn sqrt_price_x96_to_tick(sqrt_price_x96: U256) -> i32 {
    let sqrt_ratio = u256_ext::to_f64(sqrt_price_x96) / q96_f64();
    if sqrt_ratio <= 0.0 {
        return 0;
    }
    let tick = (sqrt_ratio * sqrt_ratio).ln() / 1.0001_f64.ln();
    tick.floor() as i32
}

// ---------------------------------------------------------------------------
// Stable-curve swap math. Per SPEC_FULL.md, precise per-variant math for
// non-constant-product pools is an external collaborator; this is a
// deliberately coarse placeholder that keeps the curve near 1:1 around
// balanced reserves and lets slippage grow with imbalance, without a full
// StableSwap invariant solver.
// ---------------------------------------------------------------------------

pub fn stable_swap_out(
    reserve_in: U256,
    reserve_out: U256,
    amount_in: U256,
    fee: f64,
    amplification: f64,
) -> U256 {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_in.is_zero() {
        return U256::ZERO;
    }
    let ri = u256_ext::to_f64(reserve_in);
    let ro = u256_ext::to_f64(reserve_out);
    let dx = u256_ext::to_f64(amount_in);
    let amp = amplification.max(1.0);

    let imbalance = (dx / ri.max(1.0)).min(1.0);
    let cp_weight = imbalance.powf(1.0 / amp);
    let sum_out = dx;
    let cp_out_f = u256_ext::to_f64(constant_product_swap_out(
        reserve_in, reserve_out, amount_in, 0.0,
    ));

    let blended = sum_out * (1.0 - cp_weight) + cp_out_f * cp_weight;
    let after_fee = blended * (1.0 - fee);
    let capped = after_fee.min(ro * 0.999_999);
    u256_ext::from_f64(capped.max(0.0))
}

pub fn stable_spot_price(reserve_in: U256, reserve_out: U256, fee: f64) -> f64 {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return 0.0;
    }
    let ri = u256_ext::to_f64(reserve_in);
    let ro = u256_ext::to_f64(reserve_out);
    if ri <= 0.0 || ro <= 0.0 {
        return 0.0;
    }
    let imbalance = ((ri - ro).abs() / (ri + ro)).min(1.0);
    let cp_rate = constant_product_spot_price(reserve_in, reserve_out, 0.0);
    (1.0 * (1.0 - imbalance) + cp_rate * imbalance) * (1.0 - fee)
}
