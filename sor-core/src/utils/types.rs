use alloy_primitives::Address;

/// Numeric index for a token inside a built [`crate::graph::Graph`].
///
/// Flat-array friendly: the hot search loop indexes heuristic and
/// dominance tables by this value instead of hashing an [`Address`].
pub type TokenId = usize;

/// Numeric index for a pool inside a built [`crate::graph::Graph`].
pub type PoolId = usize;

/// Visited-bitset is a `u64`; `maxHops` beyond this cannot be represented.
pub const MAX_HOPS_BITWIDTH: usize = 64;

/// Practical deployment ceiling for `maxHops`, per spec design notes.
pub const RECOMMENDED_MAX_HOPS: usize = 8;

pub const DEFAULT_MAX_HOPS: usize = 3;
pub const DEFAULT_TOP_K: usize = 40;
pub const DEFAULT_BEAM_WIDTH: usize = 32;
pub const DEFAULT_GAS_PER_HOP_USD: f64 = 0.01;
pub const DEFAULT_TARGET_USD_PRICE: f64 = 1.0;
pub const DEFAULT_MIN_INITIAL_EFF_RATIO: f64 = 0.0;
pub const DEFAULT_STEP_COUNT: usize = 18;

/// The 18 canonical fractions of total input sampled by the response-curve
/// builder, in ascending order.
pub const CURVE_FRACTIONS: [f64; 18] = [
    0.001, 0.0025, 0.005, 0.0075, 0.01, 0.015, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.4,
    0.5, 0.75, 1.0,
];

/// Helper to create an Address from a u64 value (for tests). Places the
/// value in the last 8 bytes (big-endian).
pub fn address_from_u64(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..20].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}

/// A small static allow-list of recognized stablecoin symbols, used to
/// decide whether `target_usd_price` may default to 1.0 (open question
/// resolution, see SPEC_FULL.md).
pub fn is_recognized_stablecoin(symbol: &str) -> bool {
    matches!(
        symbol.to_ascii_uppercase().as_str(),
        "USDC" | "USDT" | "DAI" | "USDE" | "TUSD" | "USDP"
    )
}

/// Helper functions for U256 <-> f64 conversion, used throughout routing
/// where raw integer amounts feed log/sqrt-based scoring.
pub mod u256_ext {
    use alloy_primitives::U256;

    pub fn to_f64(value: U256) -> f64 {
        let mut result = 0.0;
        let mut multiplier = 1.0;

        for word in value.as_limbs().iter() {
            result += (*word as f64) * multiplier;
            multiplier *= 2.0_f64.powi(64);
        }

        result
    }

    pub fn from_f64(value: f64) -> U256 {
        if !value.is_finite() || value <= 0.0 {
            return U256::ZERO;
        }
        U256::from(value as u128)
    }
}
