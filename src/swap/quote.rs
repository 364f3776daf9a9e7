// src/swap/quote.rs

use crate::blockchain::{contracts::RouterContract, ChainClient};
use crate::swap::error::SwapError;
use crate::swap::types::{Quote, Slippage, SwapPath};
use ethers_core::types::{Address, U256};
use tracing::info;

/// Asks the router what a path yields and derives the slippage-bounded
/// minimum.
pub struct QuoteEngine<'a> {
    client: &'a dyn ChainClient,
    router: Address,
}

impl<'a> QuoteEngine<'a> {
    pub fn new(client: &'a dyn ChainClient, router: Address) -> Self {
        Self { client, router }
    }

    /// `amount_in` is already in the input token's smallest unit.
    pub async fn quote(
        &self,
        path: SwapPath,
        amount_in: U256,
        slippage: Slippage,
    ) -> Result<Quote, SwapError> {
        let router = RouterContract::new(self.client, self.router);
        let amounts = router.get_amounts_out(amount_in, &path.addresses()).await?;

        if amounts.len() != path.tokens.len() {
            return Err(SwapError::Unknown(format!(
                "router returned {} amounts for a {} token path",
                amounts.len(),
                path.tokens.len()
            )));
        }
        let estimated_out = amounts.last().copied().unwrap_or_default();
        if estimated_out.is_zero() {
            return Err(SwapError::NoLiquidity {
                path: path.describe(),
            });
        }

        let minimum_out = slippage.minimum_out(estimated_out);
        info!(
            "Quote {}: {} {} -> ~{} {} (min {} at {} slippage)",
            path.describe(),
            path.input().format(amount_in),
            path.input().symbol,
            path.output().format(estimated_out),
            path.output().symbol,
            path.output().format(minimum_out),
            slippage
        );

        Ok(Quote {
            path,
            amount_in,
            estimated_out,
            minimum_out,
            slippage,
        })
    }
}
