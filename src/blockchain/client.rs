//! Chain client seam.
//!
//! Everything the swap engine needs from a node goes through [`ChainClient`]:
//! plain reads (`eth_call`, balance, code), gas estimation, and signed writes
//! followed by a receipt wait. The production implementation is
//! [`EvmClient`](super::evm_client::EvmClient); tests substitute an in-memory
//! chain.

use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use ethers_signers::LocalWallet;
use thiserror::Error;

/// Errors surfaced by a chain client.
///
/// `Rpc` carries the node's own error text (including revert reasons) so the
/// swap layer can classify it.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{0}")]
    Rpc(String),
    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("transaction {0:?} not mined before the receipt timeout")]
    ReceiptTimeout(H256),
}

impl ChainError {
    pub fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        ChainError::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::Transport(err.to_string())
    }
}

/// Stateless handle to one EVM network.
///
/// Implementations must not cache chain state between calls: reserves,
/// allowances, balances and nonces are re-read every time.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Native balance in wei.
    async fn balance(&self, owner: Address) -> Result<U256, ChainError>;

    /// Deployed bytecode; empty for externally owned accounts.
    async fn code(&self, address: Address) -> Result<Bytes, ChainError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, ChainError>;

    /// Fills in nonce, chain id and any missing gas fields, signs with
    /// `signer` and broadcasts. Returns the transaction hash.
    async fn send_transaction(
        &self,
        signer: &LocalWallet,
        tx: TransactionRequest,
    ) -> Result<H256, ChainError>;

    /// Blocks until the transaction is mined or the client's receipt timeout
    /// elapses.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError>;
}
