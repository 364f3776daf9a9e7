//! # Swap engine
//!
//! Leaf-first: [`pool::PoolResolver`] reads pairs, [`path::PathPlanner`]
//! picks a route, [`quote::QuoteEngine`] prices it, [`approval::ApprovalManager`]
//! makes sure the router may pull the input token and
//! [`executor::SwapExecutor`] submits and confirms the router call. Every raw
//! chain failure is turned into a [`SwapError`] by [`classify`].
//!
//! [`SwapService`] is the only entry point the tool layer uses. It runs the
//! pre-flight checks before any transaction is built and turns every
//! outcome, good or bad, into a [`SwapOutcome`].

pub mod approval;
pub mod classify;
pub mod error;
pub mod executor;
pub mod path;
pub mod pool;
pub mod quote;
pub mod token;
pub mod types;
pub mod units;

pub use error::SwapError;
pub use types::{Pool, Quote, Slippage, SwapPath, SwapReceipt, TokenIdentity};

use crate::blockchain::{contracts::TokenContract, ChainClient};
use approval::ApprovalManager;
use ethers_core::types::{Address, H256, U256, U64};
use ethers_signers::{LocalWallet, Signer};
use executor::{transition, SwapExecutor, SwapStage, SwapVariant};
use path::PathPlanner;
use pool::PoolResolver;
use quote::QuoteEngine;
use serde::Serialize;
use std::str::FromStr;
use tracing::{info, warn};

/// One DEX deployment plus the chain-wide settings the engine needs.
#[derive(Debug, Clone)]
pub struct DexContext {
    pub router: Address,
    pub factory: Address,
    /// Wrapped native token every route may pass through.
    pub base_asset: Address,
    /// Both reserves must be strictly above this for a pool to be usable.
    pub reserve_floor: U256,
    pub native_symbol: String,
    pub default_slippage: Slippage,
}

/// A swap as the tool layer hands it over. Addresses and amounts are still
/// strings; everything is validated in the pre-flight step.
#[derive(Debug, Clone, Default)]
pub struct SwapRequest {
    /// Ignored when `use_native_in` is set. `"native"` or the native symbol
    /// also selects native input.
    pub token_in: Option<String>,
    pub token_out: String,
    /// Human-readable amount in the input token's units.
    pub amount_in: String,
    /// Percent with at most one decimal, e.g. `"0.5"`.
    pub slippage_percent: Option<String>,
    /// Unix seconds.
    pub deadline: Option<u64>,
    pub use_native_in: bool,
    pub check_liquidity_only: bool,
    /// Defaults to the signer.
    pub recipient: Option<String>,
}

/// What the tool layer returns for a swap or a quote.
#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_tx_hash: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_amount_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_amount_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage_percent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_used: Vec<Address>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeError {
    pub kind: &'static str,
    pub message: String,
    pub suggestion: &'static str,
}

impl SwapOutcome {
    fn from_quote(quote: &Quote) -> Self {
        let output = quote.path.output();
        Self {
            success: true,
            tx_hash: None,
            approval_tx_hash: None,
            block_number: None,
            gas_used: None,
            amount_in: Some(quote.path.input().format(quote.amount_in)),
            estimated_amount_out: Some(output.format(quote.estimated_out)),
            minimum_amount_out: Some(output.format(quote.minimum_out)),
            slippage_percent: Some(quote.slippage.to_string()),
            path_used: quote.path.addresses(),
            summary: format!(
                "Quote: {} {} -> ~{} {} (minimum {} at {} slippage) via {}",
                quote.path.input().format(quote.amount_in),
                quote.path.input().symbol,
                output.format(quote.estimated_out),
                output.symbol,
                output.format(quote.minimum_out),
                quote.slippage,
                quote.path.describe()
            ),
            error: None,
        }
    }

    fn from_swap(quote: &Quote, receipt: &SwapReceipt, approval: Option<H256>) -> Self {
        let mut outcome = Self::from_quote(quote);
        outcome.tx_hash = Some(receipt.tx_hash);
        outcome.approval_tx_hash = approval;
        outcome.block_number = receipt.block_number;
        outcome.gas_used = receipt.gas_used;
        outcome.summary = format!(
            "Swapped {} {} for at least {} {} via {} in tx {:?}",
            quote.path.input().format(quote.amount_in),
            quote.path.input().symbol,
            quote.path.output().format(quote.minimum_out),
            quote.path.output().symbol,
            quote.path.describe(),
            receipt.tx_hash
        );
        outcome
    }

    pub fn failure(err: &SwapError) -> Self {
        let tx_hash = match err {
            SwapError::SwapFailed { tx_hash } | SwapError::Pending { tx_hash } => Some(*tx_hash),
            _ => None,
        };
        Self {
            success: false,
            tx_hash,
            approval_tx_hash: None,
            block_number: None,
            gas_used: None,
            amount_in: None,
            estimated_amount_out: None,
            minimum_amount_out: None,
            slippage_percent: None,
            path_used: Vec::new(),
            summary: format!("Swap failed: {}. {}", err, err.suggestion()),
            error: Some(OutcomeError {
                kind: err.kind(),
                message: err.to_string(),
                suggestion: err.suggestion(),
            }),
        }
    }
}

/// Validated request, ready for path resolution.
#[derive(Debug, Clone)]
struct Prepared {
    token_in: Address,
    token_out: Address,
    use_native_in: bool,
    amount_in: U256,
    slippage: Slippage,
    recipient: Option<Address>,
}

/// Runs one swap or quote end to end against a single DEX deployment.
pub struct SwapService<'a> {
    client: &'a dyn ChainClient,
    dex: DexContext,
}

impl<'a> SwapService<'a> {
    pub fn new(client: &'a dyn ChainClient, dex: DexContext) -> Self {
        Self { client, dex }
    }

    pub fn dex(&self) -> &DexContext {
        &self.dex
    }

    /// Prices the request without sending anything. The balance check only
    /// runs when `owner` is known.
    pub async fn quote(&self, req: &SwapRequest, owner: Option<Address>) -> Result<Quote, SwapError> {
        let mut stage = SwapStage::Idle;
        let prepared = self.prepare(req, owner).await?;
        self.price(&prepared, &mut stage).await
    }

    /// Full swap. Callers serialise invocations per signer.
    pub async fn swap(&self, signer: &LocalWallet, req: &SwapRequest) -> SwapOutcome {
        match self.try_swap(signer, req).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Swap request failed [{}]: {}", e.kind(), e);
                SwapOutcome::failure(&e)
            }
        }
    }

    /// Same as [`SwapService::quote`] but shaped for the tool layer.
    pub async fn quote_outcome(&self, req: &SwapRequest, owner: Option<Address>) -> SwapOutcome {
        match self.quote(req, owner).await {
            Ok(quote) => SwapOutcome::from_quote(&quote),
            Err(e) => {
                warn!("Quote request failed [{}]: {}", e.kind(), e);
                SwapOutcome::failure(&e)
            }
        }
    }

    async fn try_swap(&self, signer: &LocalWallet, req: &SwapRequest) -> Result<SwapOutcome, SwapError> {
        let mut stage = SwapStage::Idle;
        let owner = signer.address();
        let prepared = self.prepare(req, Some(owner)).await?;
        let quote = self.price(&prepared, &mut stage).await?;

        if req.check_liquidity_only {
            info!("check_liquidity_only set; not submitting {}", quote.path.describe());
            return Ok(SwapOutcome::from_quote(&quote));
        }

        let mut approval = None;
        if SwapVariant::for_path(&quote.path).pulls_token() {
            transition(&mut stage, SwapStage::Approving);
            approval = ApprovalManager::new(self.client)
                .ensure_allowance(signer, quote.path.input().address, self.dex.router, quote.amount_in)
                .await
                .inspect_err(|_| transition(&mut stage, SwapStage::Failed))?;
        }

        let recipient = prepared.recipient.unwrap_or(owner);
        let executed = SwapExecutor::new(self.client, self.dex.router)
            .execute(signer, &quote, recipient, req.deadline, &mut stage)
            .await;
        match executed {
            Ok(receipt) => Ok(SwapOutcome::from_swap(&quote, &receipt, approval)),
            Err(e) => {
                // The approval is already on chain; report it with the failure.
                warn!("Swap request failed [{}]: {}", e.kind(), e);
                let mut outcome = SwapOutcome::failure(&e);
                outcome.approval_tx_hash = approval;
                Ok(outcome)
            }
        }
    }

    async fn price(&self, prepared: &Prepared, stage: &mut SwapStage) -> Result<Quote, SwapError> {
        let pools = PoolResolver::new(self.client, self.dex.factory);
        let planner = PathPlanner::new(&pools, self.dex.base_asset, self.dex.reserve_floor);
        let mut path = planner
            .resolve(prepared.token_in, prepared.token_out, prepared.use_native_in)
            .await?;
        if path.native_in {
            path.tokens[0].symbol = self.dex.native_symbol.clone();
        }
        if path.native_out {
            let last = path.tokens.len() - 1;
            path.tokens[last].symbol = self.dex.native_symbol.clone();
        }
        transition(stage, SwapStage::PathResolved);

        let quote = QuoteEngine::new(self.client, self.dex.router)
            .quote(path, prepared.amount_in, prepared.slippage)
            .await?;
        transition(stage, SwapStage::Quoted);
        Ok(quote)
    }

    /// Address, amount and balance checks. Nothing here sends a transaction.
    async fn prepare(&self, req: &SwapRequest, owner: Option<Address>) -> Result<Prepared, SwapError> {
        let base = self.dex.base_asset;

        let token_out = if self.is_native_alias(&req.token_out) {
            base
        } else {
            parse_address("token_out", &req.token_out)?
        };

        let input_alias = req.token_in.as_deref().map(|t| self.is_native_alias(t)).unwrap_or(false);
        let use_native_in = req.use_native_in || input_alias;
        let token_in = if use_native_in {
            base
        } else {
            match req.token_in.as_deref() {
                Some(raw) => parse_address("token_in", raw)?,
                None => {
                    return Err(SwapError::InvalidAddress(
                        "token_in is required unless use_native_in is set".into(),
                    ))
                }
            }
        };

        if token_in == token_out {
            return Err(SwapError::InvalidAddress(format!(
                "token_in and token_out are both {:?}",
                token_in
            )));
        }

        let (code_in, code_out) = futures::join!(self.client.code(token_in), self.client.code(token_out));
        for (label, address, code) in [("token_in", token_in, code_in), ("token_out", token_out, code_out)] {
            if code?.is_empty() {
                return Err(SwapError::InvalidAddress(format!(
                    "{} {:?} has no contract code",
                    label, address
                )));
            }
        }

        let decimals = if use_native_in {
            types::DEFAULT_DECIMALS
        } else {
            token::resolve_token(self.client, token_in).await.decimals
        };
        let amount_in = units::parse_units(&req.amount_in, decimals)?;
        if amount_in.is_zero() {
            return Err(SwapError::InvalidAmount("amount_in must be greater than zero".into()));
        }

        let slippage = match req.slippage_percent.as_deref() {
            Some(raw) => Slippage::parse(raw)?,
            None => self.dex.default_slippage,
        };

        let recipient = req
            .recipient
            .as_deref()
            .map(|r| parse_address("recipient", r))
            .transpose()?;

        if let Some(owner) = owner {
            let balance = if use_native_in {
                self.client.balance(owner).await?
            } else {
                TokenContract::new(self.client, token_in).balance_of(owner).await?
            };
            if balance < amount_in {
                return Err(SwapError::InsufficientBalance(format!(
                    "{:?} holds {} but the swap needs {}",
                    owner,
                    units::format_units(balance, decimals),
                    units::format_units(amount_in, decimals)
                )));
            }
        }

        Ok(Prepared {
            token_in,
            token_out,
            use_native_in,
            amount_in,
            slippage,
            recipient,
        })
    }

    fn is_native_alias(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.eq_ignore_ascii_case("native")
            || raw.eq_ignore_ascii_case("eth")
            || raw.eq_ignore_ascii_case(&self.dex.native_symbol)
    }
}

/// Strict `0x` + 40 hex digits.
pub fn parse_address(field: &str, raw: &str) -> Result<Address, SwapError> {
    let raw = raw.trim();
    let invalid = || SwapError::InvalidAddress(format!("{} '{}' is not a 0x-prefixed address", field, raw));
    if !raw.starts_with("0x") || raw.len() != 42 {
        return Err(invalid());
    }
    Address::from_str(raw).map_err(|_| invalid())
}
