// src/swap/types.rs

use crate::swap::error::SwapError;
use crate::swap::units::format_units;
use ethers_core::types::{Address, TransactionReceipt, H256, U256, U64};
use serde::Serialize;

pub const DEFAULT_DECIMALS: u8 = 18;
pub const UNKNOWN_SYMBOL: &str = "Unknown";

/// An ERC-20 as the engine sees it. Metadata is best-effort: a token that
/// fails `decimals()` is treated as 18-decimal, one that fails `symbol()` is
/// shown as "Unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenIdentity {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenIdentity {
    pub fn unresolved(address: Address) -> Self {
        Self {
            address,
            symbol: UNKNOWN_SYMBOL.to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }

    pub fn format(&self, amount: U256) -> String {
        format_units(amount, self.decimals)
    }
}

/// A pair's state with reserves in the order the caller asked for, which may
/// differ from the pair's internal `token0`/`token1` order.
#[derive(Debug, Clone, Serialize)]
pub struct Pool {
    pub address: Address,
    pub token_a: TokenIdentity,
    pub token_b: TokenIdentity,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub exists: bool,
    /// Raw RPC error when the lookup degraded to `exists = false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Pool {
    /// Exists and both reserves are strictly above `floor`.
    pub fn is_viable(&self, floor: U256) -> bool {
        self.exists && self.reserve_a > floor && self.reserve_b > floor
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.token_a.symbol, self.token_b.symbol)
    }
}

/// Ordered 2 or 3 token route. `native_in` means the first token is the base
/// asset paid as native value; `native_out` means the last token is the base
/// asset unwrapped to native coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPath {
    pub tokens: Vec<TokenIdentity>,
    pub native_in: bool,
    pub native_out: bool,
}

impl SwapPath {
    pub fn addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|t| t.address).collect()
    }

    pub fn input(&self) -> &TokenIdentity {
        &self.tokens[0]
    }

    pub fn output(&self) -> &TokenIdentity {
        &self.tokens[self.tokens.len() - 1]
    }

    pub fn describe(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.symbol.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// Slippage tolerance in tenths of a percent, so `0.5%` is `5` and the
/// minimum-output formula stays in integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slippage {
    tenths: u16,
}

impl Slippage {
    pub const MAX_TENTHS: u16 = 1000;

    pub fn from_tenths(tenths: u16) -> Result<Self, SwapError> {
        if tenths > Self::MAX_TENTHS {
            return Err(SwapError::InvalidAmount(format!(
                "slippage {}.{}% is above 100%",
                tenths / 10,
                tenths % 10
            )));
        }
        Ok(Self { tenths })
    }

    pub fn from_percent(percent: u8) -> Result<Self, SwapError> {
        Self::from_tenths(u16::from(percent) * 10)
    }

    /// Accepts `"1"`, `"0.5"`, `"2.0"`; at most one decimal place.
    pub fn parse(input: &str) -> Result<Self, SwapError> {
        let input = input.trim().trim_end_matches('%');
        let invalid = || SwapError::InvalidAmount(format!("invalid slippage percent '{}'", input));
        let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
        let frac = frac.trim_end_matches('0');
        if (whole.is_empty() && frac.is_empty()) || frac.len() > 1 {
            return Err(invalid());
        }
        let whole: u16 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let frac: u16 = if frac.is_empty() { 0 } else { frac.parse().map_err(|_| invalid())? };
        let tenths = whole.checked_mul(10).and_then(|w| w.checked_add(frac)).ok_or_else(invalid)?;
        Self::from_tenths(tenths)
    }

    pub fn tenths(&self) -> u16 {
        self.tenths
    }

    /// `estimated * (1000 - tenths) / 1000`, never above `estimated`.
    pub fn minimum_out(&self, estimated: U256) -> U256 {
        let keep = U256::from(Self::MAX_TENTHS - self.tenths);
        let scale = U256::from(Self::MAX_TENTHS);
        match estimated.checked_mul(keep) {
            Some(product) => product / scale,
            None => estimated / scale * keep,
        }
    }
}

impl std::fmt::Display for Slippage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}%", self.tenths / 10, self.tenths % 10)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub path: SwapPath,
    pub amount_in: U256,
    pub estimated_out: U256,
    pub minimum_out: U256,
    pub slippage: Slippage,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapReceipt {
    pub tx_hash: H256,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
    pub success: bool,
}

impl From<&TransactionReceipt> for SwapReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status == Some(U64::from(1)),
        }
    }
}
