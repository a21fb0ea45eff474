pub mod builder;
pub mod dispatcher;
pub mod edge;
pub mod node;
pub mod pool;
pub mod store;

pub use builder::{build_graph, PoolRecord, TokenRecord};
pub use dispatcher::{GraphDispatcher, PoolEvent};
pub use edge::GraphEdge;
pub use node::Token;
pub use pool::{Pool, PoolOracle, PoolTokenSlot, PoolVariant};
pub use store::{Graph, GraphStats};
