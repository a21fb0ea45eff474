pub mod pool_sync;

pub use pool_sync::{PoolSyncer, SyncConfig};
