// src/blockchain/models.rs
use crate::swap::types::{Pool, TokenIdentity};
use ethers::utils::to_checksum;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

// --- Read tool responses ---

/// Native coin balance of an address.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    /// Wei, decimal string.
    pub amount: String,
    pub formatted: String,
    pub symbol: String,
}

/// Defines the structure for token information response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenInfoResponse {
    pub symbol: String,
    pub decimals: u8,
    pub contract_address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenBalanceResponse {
    pub contract_address: String,
    pub owner: String,
    pub symbol: String,
    pub decimals: u8,
    /// Smallest units, decimal string.
    pub raw: String,
    pub formatted: String,
}

// --- Pool models ---

/// One side of a pool as shown to tool callers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolSide {
    pub address: String,
    pub symbol: String,
    pub reserve: String,
    pub formatted: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolSummary {
    pub pair_address: String,
    pub exists: bool,
    pub token_a: PoolSide,
    pub token_b: PoolSide,
    /// True when both reserves are above the configured floor.
    pub viable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PoolSide {
    fn new(token: &TokenIdentity, reserve: U256) -> Self {
        Self {
            address: to_checksum(&token.address, None),
            symbol: token.symbol.clone(),
            reserve: reserve.to_string(),
            formatted: token.format(reserve),
        }
    }
}

impl PoolSummary {
    pub fn from_pool(pool: &Pool, reserve_floor: U256) -> Self {
        Self {
            pair_address: to_checksum(&pool.address, None),
            exists: pool.exists,
            token_a: PoolSide::new(&pool.token_a, pool.reserve_a),
            token_b: PoolSide::new(&pool.token_b, pool.reserve_b),
            viable: pool.is_viable(reserve_floor),
            error: pool.error.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolListResponse {
    pub factory: String,
    pub total: String,
    pub offset: u64,
    pub pools: Vec<PoolSummary>,
}
