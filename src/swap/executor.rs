// src/swap/executor.rs

use crate::blockchain::{contracts::RouterContract, ChainClient};
use crate::swap::error::SwapError;
use crate::swap::types::{Quote, SwapPath, SwapReceipt};
use ethers_core::types::{Address, TransactionRequest, U256};
use ethers_signers::{LocalWallet, Signer};
use tracing::{error, info};

/// Seconds added to "now" when the caller gives no deadline.
pub const DEFAULT_DEADLINE_SECS: u64 = 300;

/// Applied to the node's gas estimate as `gas * 12 / 10`.
pub const GAS_MULTIPLIER_NUM: u64 = 12;
pub const GAS_MULTIPLIER_DEN: u64 = 10;

/// Where a single swap invocation is. Logged on every transition; there is
/// no way back to an earlier stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    Idle,
    PathResolved,
    Quoted,
    Approving,
    Submitted,
    Confirmed,
    Failed,
}

/// Which router entry point a path needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapVariant {
    ExactEthForTokens,
    ExactTokensForEth,
    ExactTokensForTokens,
}

impl SwapVariant {
    pub fn for_path(path: &SwapPath) -> Self {
        if path.native_in {
            SwapVariant::ExactEthForTokens
        } else if path.native_out {
            SwapVariant::ExactTokensForEth
        } else {
            SwapVariant::ExactTokensForTokens
        }
    }

    /// Whether the router pulls an ERC-20 from the signer and so needs an
    /// allowance first.
    pub fn pulls_token(&self) -> bool {
        !matches!(self, SwapVariant::ExactEthForTokens)
    }
}

pub fn default_deadline() -> u64 {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    now + DEFAULT_DEADLINE_SECS
}

pub fn with_gas_margin(estimate: U256) -> U256 {
    estimate.saturating_mul(U256::from(GAS_MULTIPLIER_NUM)) / U256::from(GAS_MULTIPLIER_DEN)
}

pub(crate) fn transition(stage: &mut SwapStage, next: SwapStage) {
    info!("Swap stage {:?} -> {:?}", stage, next);
    *stage = next;
}

/// Builds, gas-estimates, submits and confirms the router call for a quote.
/// For token-input variants the allowance must already be in place.
pub struct SwapExecutor<'a> {
    client: &'a dyn ChainClient,
    router: Address,
}

impl<'a> SwapExecutor<'a> {
    pub fn new(client: &'a dyn ChainClient, router: Address) -> Self {
        Self { client, router }
    }

    pub fn build_call(&self, quote: &Quote, recipient: Address, deadline: u64) -> TransactionRequest {
        let router = RouterContract::new(self.client, self.router);
        let path = quote.path.addresses();
        let deadline = U256::from(deadline);
        match SwapVariant::for_path(&quote.path) {
            SwapVariant::ExactEthForTokens => router.swap_exact_eth_for_tokens_tx(
                quote.amount_in,
                quote.minimum_out,
                &path,
                recipient,
                deadline,
            ),
            SwapVariant::ExactTokensForEth => router.swap_exact_tokens_for_eth_tx(
                quote.amount_in,
                quote.minimum_out,
                &path,
                recipient,
                deadline,
            ),
            SwapVariant::ExactTokensForTokens => router.swap_exact_tokens_for_tokens_tx(
                quote.amount_in,
                quote.minimum_out,
                &path,
                recipient,
                deadline,
            ),
        }
    }

    /// A receipt with a failing status is returned as `SwapFailed`, not as a
    /// receipt with `success = false`.
    pub async fn execute(
        &self,
        signer: &LocalWallet,
        quote: &Quote,
        recipient: Address,
        deadline: Option<u64>,
        stage: &mut SwapStage,
    ) -> Result<SwapReceipt, SwapError> {
        let deadline = deadline.unwrap_or_else(default_deadline);
        let tx = self
            .build_call(quote, recipient, deadline)
            .from(signer.address());

        let result = self.submit(signer, tx, stage).await;
        if let Err(e) = &result {
            error!("Swap {} failed: {}", quote.path.describe(), e);
            transition(stage, SwapStage::Failed);
        }
        result
    }

    async fn submit(
        &self,
        signer: &LocalWallet,
        tx: TransactionRequest,
        stage: &mut SwapStage,
    ) -> Result<SwapReceipt, SwapError> {
        let estimate = self.client.estimate_gas(&tx).await?;
        let gas = with_gas_margin(estimate);
        info!("Gas estimate {} -> limit {}", estimate, gas);

        let tx_hash = self.client.send_transaction(signer, tx.gas(gas)).await?;
        transition(stage, SwapStage::Submitted);

        let receipt = SwapReceipt::from(&self.client.wait_for_receipt(tx_hash).await?);
        if !receipt.success {
            return Err(SwapError::SwapFailed { tx_hash });
        }
        transition(stage, SwapStage::Confirmed);
        Ok(receipt)
    }
}
