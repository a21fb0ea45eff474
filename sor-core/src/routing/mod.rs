pub mod astar;
pub mod curve;
pub mod evaluator;
pub mod heuristic;
pub mod hillclimb;
pub mod path;
pub mod quoter;
pub mod waterfill;

pub use astar::{find_top_k_routes, find_top_k_routes_with_penalty, AstarResult};
pub use curve::{build_response_curve, filter_by_initial_efficiency, CurveSample, ResponseCurve};
pub use evaluator::{select_best, simulate_route, BestSingle};
pub use heuristic::{build_heuristic, Heuristic};
pub use hillclimb::hill_climb;
pub use path::{Path, PathHop};
pub use quoter::{
    BestSingleOutput, Diagnostics, PathAllocationOutput, PathHopOutput, PathOutput, QuoteRequest,
    QuoteResponse, Quoter, RoutingConfig, SplitAlgorithm, SplitOutput,
};
pub use waterfill::{water_fill, Allocation, PathAllocation};
