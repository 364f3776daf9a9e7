//! Route selection.
//!
//! Candidate strategies are tried in rank order and the first viable one
//! wins. A direct pool always beats a route through the base asset, and a
//! native-coin input is never routed through a third token.

use crate::swap::error::SwapError;
use crate::swap::pool::PoolResolver;
use crate::swap::types::{Pool, SwapPath};
use ethers_core::types::{Address, U256};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStrategy {
    /// `[base, out]`, paid with native coin.
    NativeIn,
    /// `[in, base]`, output unwrapped to native coin.
    ToBase,
    /// `[in, out]`.
    Direct,
    /// `[in, base, out]`.
    ViaBase,
}

/// The ranked candidate list for a request shape.
pub fn candidate_strategies(use_native_in: bool, token_out_is_base: bool) -> &'static [PathStrategy] {
    if use_native_in {
        &[PathStrategy::NativeIn]
    } else if token_out_is_base {
        &[PathStrategy::ToBase]
    } else {
        &[PathStrategy::Direct, PathStrategy::ViaBase]
    }
}

pub struct PathPlanner<'a> {
    pools: &'a PoolResolver<'a>,
    base_asset: Address,
    reserve_floor: U256,
}

impl<'a> PathPlanner<'a> {
    pub fn new(pools: &'a PoolResolver<'a>, base_asset: Address, reserve_floor: U256) -> Self {
        Self {
            pools,
            base_asset,
            reserve_floor,
        }
    }

    /// `token_in` is ignored when `use_native_in` is set.
    pub async fn resolve(
        &self,
        token_in: Address,
        token_out: Address,
        use_native_in: bool,
    ) -> Result<SwapPath, SwapError> {
        let mut missing = Vec::new();

        for strategy in candidate_strategies(use_native_in, token_out == self.base_asset) {
            match self.attempt(*strategy, token_in, token_out).await {
                Ok(path) => {
                    info!("Resolved path {} via {:?}", path.describe(), strategy);
                    return Ok(path);
                }
                Err(hops) => {
                    debug!("{:?} not viable, missing {}", strategy, hops.join(", "));
                    missing.extend(hops);
                }
            }
        }

        missing.dedup();
        Err(SwapError::NoViablePath { missing })
    }

    /// Returns the path, or a description of each hop that had no usable pool.
    async fn attempt(
        &self,
        strategy: PathStrategy,
        token_in: Address,
        token_out: Address,
    ) -> Result<SwapPath, Vec<String>> {
        let base = self.base_asset;
        match strategy {
            PathStrategy::NativeIn => {
                let pool = self.viable(base, token_out).await.map_err(|m| vec![m])?;
                Ok(SwapPath {
                    tokens: vec![pool.token_a, pool.token_b],
                    native_in: true,
                    native_out: false,
                })
            }
            PathStrategy::ToBase => {
                let pool = self.viable(token_in, base).await.map_err(|m| vec![m])?;
                Ok(SwapPath {
                    tokens: vec![pool.token_a, pool.token_b],
                    native_in: false,
                    native_out: true,
                })
            }
            PathStrategy::Direct => {
                let pool = self.viable(token_in, token_out).await.map_err(|m| vec![m])?;
                Ok(SwapPath {
                    tokens: vec![pool.token_a, pool.token_b],
                    native_in: false,
                    native_out: false,
                })
            }
            PathStrategy::ViaBase => {
                let (first, second) = futures::join!(
                    self.viable(token_in, base),
                    self.viable(base, token_out)
                );
                match (first, second) {
                    (Ok(first), Ok(second)) => Ok(SwapPath {
                        tokens: vec![first.token_a, first.token_b, second.token_b],
                        native_in: false,
                        native_out: false,
                    }),
                    (first, second) => Err([first.err(), second.err()].into_iter().flatten().collect()),
                }
            }
        }
    }

    async fn viable(&self, token_a: Address, token_b: Address) -> Result<Pool, String> {
        let pool = self.pools.check_liquidity(token_a, token_b).await;
        if pool.is_viable(self.reserve_floor) {
            return Ok(pool);
        }
        Err(if pool.exists {
            format!(
                "pool {} at {:?} has reserves {} / {}, not above the floor of {}",
                pool.label(),
                pool.address,
                pool.reserve_a,
                pool.reserve_b,
                self.reserve_floor
            )
        } else {
            match &pool.error {
                Some(err) => format!("pool {} could not be read: {}", pool.label(), err),
                None => format!("no pool for {}", pool.label()),
            }
        })
    }
}
