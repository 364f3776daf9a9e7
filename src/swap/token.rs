// src/swap/token.rs

use crate::blockchain::{contracts::TokenContract, ChainClient};
use crate::swap::types::TokenIdentity;
use ethers_core::types::Address;
use tracing::debug;

/// Reads `decimals()` and `symbol()` side by side, falling back to the
/// defaults on any failure. Never errors.
pub async fn resolve_token(client: &dyn ChainClient, address: Address) -> TokenIdentity {
    let token = TokenContract::new(client, address);
    let (decimals, symbol) = futures::join!(token.decimals(), token.symbol());

    let mut identity = TokenIdentity::unresolved(address);
    match decimals {
        Ok(d) => identity.decimals = d,
        Err(e) => debug!("decimals() failed for {:?}, assuming 18: {}", address, e),
    }
    match symbol {
        Ok(s) if !s.trim().is_empty() => identity.symbol = s,
        Ok(_) => {}
        Err(e) => debug!("symbol() failed for {:?}: {}", address, e),
    }
    identity
}
