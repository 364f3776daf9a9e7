// src/swap/pool.rs

use crate::blockchain::{
    contracts::{FactoryContract, PairContract},
    ChainClient, ChainError,
};
use crate::swap::token::resolve_token;
use crate::swap::types::{Pool, TokenIdentity};
use ethers_core::types::{Address, U256};
use tracing::{debug, warn};

/// Looks up a pair through the factory and reads its reserves.
pub struct PoolResolver<'a> {
    client: &'a dyn ChainClient,
    factory: Address,
}

impl<'a> PoolResolver<'a> {
    pub fn new(client: &'a dyn ChainClient, factory: Address) -> Self {
        Self { client, factory }
    }

    /// Never fails: RPC errors come back as `exists = false` with the raw
    /// error kept on the pool.
    pub async fn check_liquidity(&self, token_a: Address, token_b: Address) -> Pool {
        let (identity_a, identity_b) = futures::join!(
            resolve_token(self.client, token_a),
            resolve_token(self.client, token_b)
        );

        match self.read_pool(token_a, token_b).await {
            Ok(Some((address, reserve_a, reserve_b))) => {
                debug!(
                    "Pool {}/{} at {:?}: reserves {} / {}",
                    identity_a.symbol, identity_b.symbol, address, reserve_a, reserve_b
                );
                Pool {
                    address,
                    token_a: identity_a,
                    token_b: identity_b,
                    reserve_a,
                    reserve_b,
                    exists: true,
                    error: None,
                }
            }
            Ok(None) => missing_pool(identity_a, identity_b, None),
            Err(e) => {
                warn!(
                    "Pool lookup for {}/{} failed: {}",
                    identity_a.symbol, identity_b.symbol, e
                );
                missing_pool(identity_a, identity_b, Some(e.to_string()))
            }
        }
    }

    /// Pages through the factory's pair list. Returns the factory's total
    /// pair count alongside the requested slice; a pair that fails to read is
    /// listed with `exists = false`.
    pub async fn list_pools(&self, offset: u64, limit: u64) -> Result<(U256, Vec<Pool>), ChainError> {
        let factory = FactoryContract::new(self.client, self.factory);
        let total = factory.all_pairs_length().await?;
        let start = U256::from(offset);
        let end = total.min(start.saturating_add(U256::from(limit)));

        let mut pools = Vec::new();
        let mut index = start;
        while index < end {
            let pair_address = factory.all_pairs(index).await?;
            pools.push(self.read_listed(pair_address).await);
            index += U256::one();
        }
        debug!("Listed {} of {} pools from offset {}", pools.len(), total, offset);
        Ok((total, pools))
    }

    async fn read_listed(&self, pair_address: Address) -> Pool {
        let pair = PairContract::new(self.client, pair_address);
        let (token0, token1, reserves) = futures::join!(pair.token0(), pair.token1(), pair.get_reserves());
        match (token0, token1, reserves) {
            (Ok(token0), Ok(token1), Ok((reserve0, reserve1))) => {
                let (identity0, identity1) = futures::join!(
                    resolve_token(self.client, token0),
                    resolve_token(self.client, token1)
                );
                Pool {
                    address: pair_address,
                    token_a: identity0,
                    token_b: identity1,
                    reserve_a: reserve0,
                    reserve_b: reserve1,
                    exists: true,
                    error: None,
                }
            }
            (token0, token1, reserves) => {
                let error = [token0.err(), token1.err(), reserves.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .next();
                warn!("Pair {:?} could not be read: {:?}", pair_address, error);
                let mut pool = missing_pool(
                    TokenIdentity::unresolved(Address::zero()),
                    TokenIdentity::unresolved(Address::zero()),
                    error,
                );
                pool.address = pair_address;
                pool
            }
        }
    }

    async fn read_pool(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<(Address, U256, U256)>, ChainError> {
        let factory = FactoryContract::new(self.client, self.factory);
        let pair_address = factory.get_pair(token_a, token_b).await?;
        if pair_address.is_zero() {
            return Ok(None);
        }

        let pair = PairContract::new(self.client, pair_address);
        let (reserves, token0) = futures::join!(pair.get_reserves(), pair.token0());
        let (reserve0, reserve1) = reserves?;
        let token0 = token0?;

        let (reserve_a, reserve_b) = if token0 == token_a {
            (reserve0, reserve1)
        } else {
            let token1 = pair.token1().await?;
            if token1 != token_a {
                return Err(ChainError::decode(
                    "pair tokens",
                    format!("pair {:?} holds neither side as {:?}", pair_address, token_a),
                ));
            }
            (reserve1, reserve0)
        };
        Ok(Some((pair_address, reserve_a, reserve_b)))
    }
}

fn missing_pool(token_a: TokenIdentity, token_b: TokenIdentity, error: Option<String>) -> Pool {
    Pool {
        address: Address::zero(),
        token_a,
        token_b,
        reserve_a: U256::zero(),
        reserve_b: U256::zero(),
        exists: false,
        error,
    }
}
