use alloy_primitives::Address;
use thiserror::Error;

/// Error taxonomy for the routing core.
///
/// Only [`RouterError::InputInvalid`] is meant to surface as a hard `Err`
/// from the public [`crate::routing::Quoter::quote`] entrypoint. Every other
/// variant is a degraded-but-successful outcome and is folded into
/// `Diagnostics` on the response rather than propagated — see the
/// propagation policy in SPEC_FULL.md section 7.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    /// Unknown source/target address, non-positive amount, or a
    /// nonsensical config value (e.g. `max_hops == 0`).
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("no route found from {from} to {to}")]
    NoRouteFound { from: Address, to: Address },

    /// A* / splitter / heuristic exhausted its iteration or wall-clock
    /// budget. The caller still receives the best-so-far answer.
    #[error("budget exceeded in {stage}")]
    BudgetExceeded { stage: &'static str },

    /// A `pool.swap` call returned a non-finite value; the hop is treated
    /// as yielding zero and the path is dropped.
    #[error("oracle fault in pool {pool_id}: {reason}")]
    OracleFault { pool_id: String, reason: String },

    /// The dispatcher observed a reserve transition that would produce
    /// non-positive reserves or NaN weights; the update was skipped.
    #[error("graph inconsistent for pool {pool_id}: {reason}")]
    GraphInconsistent { pool_id: String, reason: String },

    #[error("insufficient liquidity: required {required}, available {available}")]
    InsufficientLiquidity { required: String, available: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
