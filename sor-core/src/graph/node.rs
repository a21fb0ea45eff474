use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A token in the liquidity graph. Immutable for the lifetime of the graph;
/// only reserves on the pools touching it ever change.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub addr: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(addr: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            addr,
            symbol: symbol.into(),
            decimals,
        }
    }

    pub fn is_stablecoin(&self) -> bool {
        crate::utils::types::is_recognized_stablecoin(&self.symbol)
    }

    /// Convert a human-readable amount into raw smallest-unit terms.
    pub fn to_raw(&self, human: f64) -> u128 {
        (human * 10f64.powi(self.decimals as i32)).max(0.0) as u128
    }

    /// Convert a raw smallest-unit amount into human-readable terms.
    pub fn to_human(&self, raw: u128) -> f64 {
        raw as f64 / 10f64.powi(self.decimals as i32)
    }
}
