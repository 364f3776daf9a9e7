// src/swap/error.rs

use crate::blockchain::ChainError;
use crate::swap::classify::{classify, FailureKind};
use crate::swap::units::UnitsError;
use ethers_core::types::H256;
use thiserror::Error;

/// Every way a swap invocation can end without a confirmed trade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("no viable swap path: {}", missing.join("; "))]
    NoViablePath { missing: Vec<String> },
    #[error("router quoted zero output for {path}")]
    NoLiquidity { path: String },
    #[error("slippage tolerance exceeded: {0}")]
    SlippageExceeded(String),
    #[error("insufficient pool liquidity: {0}")]
    InsufficientLiquidity(String),
    #[error("transaction deadline expired: {0}")]
    Expired(String),
    #[error("router rejected the transaction: {0}")]
    RouterRejected(String),
    #[error("insufficient funds for gas: {0}")]
    InsufficientGas(String),
    #[error("swap transaction {tx_hash:?} was mined but reverted")]
    SwapFailed { tx_hash: H256 },
    #[error("transaction {tx_hash:?} was sent but no receipt arrived in time; it may still be mined")]
    Pending { tx_hash: H256 },
    #[error("{0}")]
    Unknown(String),
}

impl SwapError {
    /// Builds a classified error from raw chain error text.
    pub fn from_chain(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match classify(&raw) {
            FailureKind::InsufficientFunds => {
                if is_gas_shortfall(&raw) {
                    SwapError::InsufficientGas(raw)
                } else {
                    SwapError::InsufficientBalance(raw)
                }
            }
            FailureKind::SlippageExceeded => SwapError::SlippageExceeded(raw),
            FailureKind::InsufficientLiquidity => SwapError::InsufficientLiquidity(raw),
            FailureKind::Expired => SwapError::Expired(raw),
            FailureKind::RouterRejected => SwapError::RouterRejected(raw),
            FailureKind::Unknown(raw) => SwapError::Unknown(raw),
        }
    }

    /// Stable machine-readable code for the outer boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            SwapError::InvalidAddress(_) => "invalid_address",
            SwapError::InvalidAmount(_) => "invalid_amount",
            SwapError::InsufficientBalance(_) => "insufficient_balance",
            SwapError::NoViablePath { .. } => "no_viable_path",
            SwapError::NoLiquidity { .. } => "no_liquidity",
            SwapError::SlippageExceeded(_) => "slippage_exceeded",
            SwapError::InsufficientLiquidity(_) => "insufficient_liquidity",
            SwapError::Expired(_) => "expired",
            SwapError::RouterRejected(_) => "router_rejected",
            SwapError::InsufficientGas(_) => "insufficient_gas",
            SwapError::SwapFailed { .. } => "swap_failed",
            SwapError::Pending { .. } => "pending",
            SwapError::Unknown(_) => "unknown",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            SwapError::InvalidAddress(_) => "Check that both token addresses are 0x-prefixed contracts on this network.",
            SwapError::InvalidAmount(_) => "Pass a positive decimal amount with no more places than the token's decimals.",
            SwapError::InsufficientBalance(_) => "Top up the input token or reduce the amount.",
            SwapError::NoViablePath { .. } => "Verify the pair has liquidity, or route through a token that has pools with both sides.",
            SwapError::NoLiquidity { .. } => "Verify the pair has liquidity or try a smaller amount.",
            SwapError::SlippageExceeded(_) => "Increase slippage tolerance or reduce the amount.",
            SwapError::InsufficientLiquidity(_) => "Reduce the amount or pick a pool with deeper reserves.",
            SwapError::Expired(_) => "Retry with a later deadline; the quote will be refreshed.",
            SwapError::RouterRejected(_) => "Check the path, amounts and token approvals, then retry.",
            SwapError::InsufficientGas(_) => "Fund the signer with native coin to cover gas.",
            SwapError::SwapFailed { .. } => "Inspect the transaction on an explorer; market conditions may have moved. Re-quote before retrying.",
            SwapError::Pending { .. } => "Check the pending transaction on an explorer before retrying; sending again could swap twice.",
            SwapError::Unknown(_) => "Retry later or inspect the raw error.",
        }
    }
}

// The RPC method name ("eth_estimateGas") is part of the raw text, so a bare
// "gas" match is not enough.
fn is_gas_shortfall(raw: &str) -> bool {
    let upper = raw.to_uppercase();
    ["FOR GAS", "OUT OF GAS", "INTRINSIC GAS", "GAS REQUIRED"]
        .iter()
        .any(|needle| upper.contains(needle))
}

impl From<ChainError> for SwapError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rpc(raw) => SwapError::from_chain(raw),
            ChainError::ReceiptTimeout(tx_hash) => SwapError::Pending { tx_hash },
            other => SwapError::Unknown(other.to_string()),
        }
    }
}

impl From<UnitsError> for SwapError {
    fn from(err: UnitsError) -> Self {
        SwapError::InvalidAmount(err.to_string())
    }
}
