// src/swap/approval.rs

use crate::blockchain::{contracts::TokenContract, ChainClient};
use crate::swap::error::SwapError;
use ethers_core::types::{Address, H256, U256, U64};
use ethers_signers::{LocalWallet, Signer};
use tracing::{debug, info};

/// Makes sure the router may pull the input token from the signer.
pub struct ApprovalManager<'a> {
    client: &'a dyn ChainClient,
}

impl<'a> ApprovalManager<'a> {
    pub fn new(client: &'a dyn ChainClient) -> Self {
        Self { client }
    }

    /// Pure read when the current allowance covers `amount`. Otherwise sends
    /// one unlimited approval, waits for it to be mined and returns its hash,
    /// so later swaps of the same token skip this step.
    pub async fn ensure_allowance(
        &self,
        signer: &LocalWallet,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Option<H256>, SwapError> {
        let owner = signer.address();
        let contract = TokenContract::new(self.client, token);

        let current = contract.allowance(owner, spender).await?;
        if current >= amount {
            debug!("Allowance {} for {:?} already covers {}", current, spender, amount);
            return Ok(None);
        }

        info!(
            "Allowance {} < {}; approving {:?} to spend token {:?}",
            current, amount, spender, token
        );
        let tx_hash = self
            .client
            .send_transaction(signer, contract.approve_tx(spender, U256::MAX))
            .await?;
        let receipt = self.client.wait_for_receipt(tx_hash).await?;
        if receipt.status != Some(U64::from(1)) {
            return Err(SwapError::RouterRejected(format!(
                "approval transaction {:?} reverted",
                tx_hash
            )));
        }
        Ok(Some(tx_hash))
    }
}
