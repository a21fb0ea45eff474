//! Smart order router core: builds a liquidity graph over pool reserves,
//! searches it for the top-K candidate routes with an A*-style search, and
//! optionally splits a swap across several routes to equilibrate marginal
//! prices.

pub mod api;
pub mod cache;
pub mod config;
pub mod graph;
pub mod routing;
pub mod sync;
pub mod utils;

pub use graph::{Graph, GraphDispatcher, Pool, PoolEvent, Token};
pub use routing::{Quoter, QuoteRequest, QuoteResponse, RoutingConfig};

pub use utils::error::{Result, RouterError};
pub use utils::types::*;
