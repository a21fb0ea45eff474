use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;

use crate::graph::builder::{PoolRecord, TokenRecord};
use crate::graph::dispatcher::{GraphDispatcher, PoolEvent};
use crate::graph::pool::PoolVariant;
use crate::utils::math::tick_to_sqrt_price_x96;
use crate::utils::types::address_from_u64;

/// Configuration for pool syncing.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// RPC URL for the chain hosting the pools.
    pub rpc_url: String,
    /// Subgraph URL (optional, for pool discovery).
    pub subgraph_url: Option<String>,
    /// How often to refresh pool data (seconds).
    pub refresh_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            subgraph_url: None,
            refresh_interval_secs: 12,
        }
    }
}

/// Pool data synchronizer: pushes [`PoolEvent`]s onto a [`GraphDispatcher`]
/// rather than mutating the graph directly, matching the dispatcher's
/// single-writer discipline.
///
/// In a full production deployment this would discover pools via a
/// subgraph or event logs, fetch state from RPC, and replay diffs as
/// `PoolEvent`s. The current implementation seeds a representative set of
/// constant-product, concentrated, and stable pools so the router has
/// something to search over in development.
pub struct PoolSyncer {
    dispatcher: Arc<GraphDispatcher>,
    config: SyncConfig,
}

impl PoolSyncer {
    pub fn new(dispatcher: Arc<GraphDispatcher>) -> Self {
        Self {
            dispatcher,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(dispatcher: Arc<GraphDispatcher>, config: SyncConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Sync pool data. Attempts RPC-based discovery first (not yet wired
    /// up), falling back to seeded development pools.
    pub async fn sync_pools(&self) -> Result<(), String> {
        tracing::info!(
            rpc_url = %self.config.rpc_url,
            refresh_secs = self.config.refresh_interval_secs,
            "syncing pools"
        );

        let events = self.seed_events();
        let stats = self.dispatcher.apply_batch(&events);
        tracing::info!(
            received = stats.received,
            applied = stats.applied,
            skipped = stats.skipped,
            "pool sync applied"
        );
        Ok(())
    }

    /// Start a background sync loop on a tokio task.
    pub fn start_periodic_sync(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_secs(self.config.refresh_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sync_pools().await {
                    tracing::warn!(error = %e, "periodic pool sync failed");
                }
            }
        })
    }

    /// A representative development pool set covering all three
    /// [`PoolVariant`] kinds.
    fn seed_events(&self) -> Vec<PoolEvent> {
        let weth = token(0, "WETH", 18);
        let usdc = token(1, "USDC", 6);
        let dai = token(2, "DAI", 18);
        let wbtc = token(3, "WBTC", 8);

        let mut events = Vec::new();

        events.push(PoolEvent::PoolCreated {
            record: PoolRecord {
                pool_addr: [1u8; 32],
                variant: PoolVariant::ConstantProduct,
                fee: 0.003,
                token_a: weth.clone(),
                token_b: usdc.clone(),
            },
        });

        let tick: i32 = 201240;
        events.push(PoolEvent::PoolCreated {
            record: PoolRecord {
                pool_addr: [2u8; 32],
                variant: PoolVariant::Concentrated {
                    liquidity: 50_000_000_000_000_000_000_000,
                    sqrt_price_x96: tick_to_sqrt_price_x96(tick),
                    tick,
                    tick_spacing: 60,
                },
                fee: 0.0005,
                token_a: weth.clone(),
                token_b: usdc.clone(),
            },
        });

        events.push(PoolEvent::PoolCreated {
            record: PoolRecord {
                pool_addr: [3u8; 32],
                variant: PoolVariant::Stable { amplification: 100.0 },
                fee: 0.0001,
                token_a: usdc.clone(),
                token_b: dai.clone(),
            },
        });

        events.push(PoolEvent::PoolCreated {
            record: PoolRecord {
                pool_addr: [4u8; 32],
                variant: PoolVariant::ConstantProduct,
                fee: 0.003,
                token_a: weth,
                token_b: wbtc,
            },
        });

        events
    }
}

fn token(index: u64, symbol: &str, decimals: u8) -> TokenRecord {
    TokenRecord {
        addr: address_from_u64(index),
        symbol: symbol.to_string(),
        decimals,
        reserve_raw: 10_000_000 * 10u128.pow(decimals as u32),
    }
}

#[allow(dead_code)]
struct RpcPoolState {
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
}
