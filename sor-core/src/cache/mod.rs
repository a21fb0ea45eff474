pub mod heuristic_cache;
pub mod quote_cache;

pub use heuristic_cache::{HeuristicCache, HeuristicCacheStats};
pub use quote_cache::{QuoteCache, QuoteCacheStats};
