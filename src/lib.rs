// src/lib.rs

use std::sync::Arc;

// Re-export commonly used types
pub use ethers::types::{Address, H256, U256, U64};

// Re-export modules
pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod swap;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::Config>,
    /// Node access for reads and signed writes
    pub chain: Arc<dyn blockchain::ChainClient>,
    /// Serialises swaps per signer address
    pub signer_locks: blockchain::signer_locks::SignerLocks,
}

impl AppState {
    pub fn new(config: config::Config, chain: Arc<dyn blockchain::ChainClient>) -> Self {
        Self {
            config: Arc::new(config),
            chain,
            signer_locks: blockchain::signer_locks::SignerLocks::new(),
        }
    }
}
