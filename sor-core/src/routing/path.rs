use serde::{Deserialize, Serialize};

use crate::graph::edge::CAP_SENTINEL;
use crate::graph::GraphEdge;
use crate::utils::types::{PoolId, TokenId};

/// One hop inside a [`Path`]: the pool traversed and the tokens on either
/// side, matching spec's `{poolAddr, fromAddr, toAddr}` output shape once
/// translated back from numeric ids at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathHop {
    pub pool_id: PoolId,
    pub from: TokenId,
    pub to: TokenId,
}

/// A chain of hops from a source token to a target token. `edge[i].to ==
/// edge[i+1].from` for all `i`; the first hop starts at the source, the
/// last ends at the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub hops: Vec<PathHop>,
    /// Sum of `log_spot_price` across hops minus the realized gas penalty;
    /// the terminal A* score `g`.
    pub terminal_score: f64,
    /// Per-hop individual-swap ceiling, smallest across the path.
    pub cap_raw: u128,
}

impl Path {
    pub fn from_edges(edges: &[GraphEdge], terminal_score: f64) -> Self {
        let cap_raw = edges
            .iter()
            .map(|e| e.dx_cap_raw)
            .min()
            .unwrap_or(CAP_SENTINEL);
        let hops = edges
            .iter()
            .map(|e| PathHop {
                pool_id: e.pool_id,
                from: e.from,
                to: e.to,
            })
            .collect();
        Self {
            hops,
            terminal_score,
            cap_raw,
        }
    }

    pub fn source(&self) -> Option<TokenId> {
        self.hops.first().map(|h| h.from)
    }

    pub fn target(&self) -> Option<TokenId> {
        self.hops.last().map(|h| h.to)
    }

    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// The ordered pool-id sequence, used for A*'s uniqueness/dedup check
    /// and property 2 (path uniqueness).
    pub fn pool_sequence(&self) -> Vec<PoolId> {
        self.hops.iter().map(|h| h.pool_id).collect()
    }

    /// `true` iff every token id appears at most once on the path.
    pub fn is_simple(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        seen.insert(self.hops.first().map(|h| h.from));
        for hop in &self.hops {
            if !seen.insert(Some(hop.to)) {
                return false;
            }
        }
        true
    }
}
