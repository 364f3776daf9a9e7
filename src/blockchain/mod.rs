// src/blockchain/mod.rs

pub mod abi;
pub mod client;
pub mod contracts;
pub mod evm_client;
pub mod models;
pub mod signer_locks;

pub use client::{ChainClient, ChainError};
pub use evm_client::EvmClient;

// Re-export commonly used types
pub use ethers::{
    types::{Address, H256, U256},
    utils::to_checksum,
};
