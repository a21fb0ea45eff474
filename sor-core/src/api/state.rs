use std::sync::Arc;

use crate::cache::QuoteCache;
use crate::config::Settings;
use crate::graph::{Graph, GraphDispatcher};
use crate::routing::Quoter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub quoter: Arc<Quoter>,
    pub graph: Arc<Graph>,
    pub dispatcher: Arc<GraphDispatcher>,
    pub cache: Arc<QuoteCache>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let graph = Arc::new(Graph::new());
        let dispatcher = Arc::new(GraphDispatcher::new(graph.clone()));
        let quoter = Arc::new(Quoter::new(graph.clone()));
        let cache = Arc::new(QuoteCache::default());

        Self {
            quoter,
            graph,
            dispatcher,
            cache,
            settings,
        }
    }
}
