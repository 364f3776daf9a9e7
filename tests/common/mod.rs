//! In-memory chain for integration tests.
//!
//! Decodes calldata by selector and answers like a V2 factory, pairs, a
//! router and plain ERC-20s. Writes are recorded; `approve` updates the
//! allowance so a second swap sees it.

#![allow(dead_code)]

use async_trait::async_trait;
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{
    Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256, U64,
};
use ethers_signers::{LocalWallet, Signer};
use evm_swap_mcp::{
    blockchain::{abi::selector, contracts, ChainClient, ChainError},
    swap::{DexContext, Slippage},
};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Mutex;

pub const SIGNER_KEY: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

pub fn signer() -> LocalWallet {
    LocalWallet::from_str(SIGNER_KEY).unwrap()
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn factory() -> Address {
    addr(0xfac)
}

pub fn router() -> Address {
    addr(0x707)
}

pub fn base() -> Address {
    addr(0xba5e)
}

pub fn eth(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn dex() -> DexContext {
    DexContext {
        router: router(),
        factory: factory(),
        base_asset: base(),
        reserve_floor: U256::from(1000),
        native_symbol: "ETH".to_string(),
        default_slippage: Slippage::from_tenths(5).unwrap(),
    }
}

#[derive(Debug, Clone)]
pub struct SentTx {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
    pub gas: Option<U256>,
}

impl SentTx {
    pub fn selector(&self) -> [u8; 4] {
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&self.data[0..4]);
        sel
    }
}

#[derive(Default)]
struct FakeToken {
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

struct FakePair {
    token0: Address,
    token1: Address,
    reserve0: U256,
    reserve1: U256,
}

#[derive(Default)]
struct State {
    tokens: HashMap<Address, FakeToken>,
    pairs: HashMap<Address, FakePair>,
    pair_list: Vec<Address>,
    native: HashMap<Address, U256>,
    failing: HashSet<Address>,
    sent: Vec<SentTx>,
    receipts: HashMap<H256, bool>,
    estimate_error: Option<String>,
    gas_estimate: U256,
    swap_reverts: bool,
    receipts_stall: bool,
    amounts_override: Option<Vec<U256>>,
}

pub struct FakeChain {
    state: Mutex<State>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn is(data: &[u8], sig: &str) -> bool {
    data.len() >= 4 && data[0..4] == selector(sig)
}

fn revert(msg: &str) -> ChainError {
    ChainError::Rpc(format!("eth_call failed: execution reverted: {}", msg))
}

impl FakeChain {
    /// Factory, router and the base token are deployed; nothing else.
    pub fn new() -> Self {
        let chain = Self {
            state: Mutex::new(State {
                gas_estimate: U256::from(100_000),
                ..State::default()
            }),
        };
        chain.add_token(base(), "WETH", 18);
        chain
    }

    pub fn add_token(&self, address: Address, symbol: &str, decimals: u8) {
        self.state.lock().unwrap().tokens.insert(
            address,
            FakeToken {
                symbol: symbol.to_string(),
                decimals,
                ..FakeToken::default()
            },
        );
    }

    /// Reserves are given in `(a, b)` order; the pair stores them sorted.
    pub fn add_pair(&self, a: Address, b: Address, reserve_a: U256, reserve_b: U256) -> Address {
        let mut state = self.state.lock().unwrap();
        let pair_address = addr(0x9000 + state.pair_list.len() as u64);
        let (token0, token1) = sorted(a, b);
        let (reserve0, reserve1) = if token0 == a {
            (reserve_a, reserve_b)
        } else {
            (reserve_b, reserve_a)
        };
        state.pairs.insert(
            pair_address,
            FakePair {
                token0,
                token1,
                reserve0,
                reserve1,
            },
        );
        state.pair_list.push(pair_address);
        pair_address
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        let mut state = self.state.lock().unwrap();
        if let Some(t) = state.tokens.get_mut(&token) {
            t.balances.insert(owner, amount);
        }
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        let mut state = self.state.lock().unwrap();
        if let Some(t) = state.tokens.get_mut(&token) {
            t.allowances.insert((owner, spender), amount);
        }
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.state.lock().unwrap().native.insert(owner, amount);
    }

    /// Every `eth_call` to `address` fails with an RPC error.
    pub fn fail_calls_to(&self, address: Address) {
        self.state.lock().unwrap().failing.insert(address);
    }

    pub fn fail_estimate_with(&self, message: &str) {
        self.state.lock().unwrap().estimate_error = Some(message.to_string());
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().unwrap().gas_estimate = U256::from(gas);
    }

    pub fn revert_swaps(&self) {
        self.state.lock().unwrap().swap_reverts = true;
    }

    /// Swaps are accepted but never mined; approvals still confirm.
    pub fn stall_swap_receipts(&self) {
        self.state.lock().unwrap().receipts_stall = true;
    }

    pub fn override_amounts_out(&self, amounts: Vec<U256>) {
        self.state.lock().unwrap().amounts_override = Some(amounts);
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .get(&token)
            .and_then(|t| t.allowances.get(&(owner, spender)).copied())
            .unwrap_or_default()
    }

    fn pair_for(state: &State, a: Address, b: Address) -> Option<Address> {
        let key = sorted(a, b);
        state
            .pair_list
            .iter()
            .copied()
            .find(|p| state.pairs.get(p).map(|x| (x.token0, x.token1)) == Some(key))
    }

    fn amounts_out(state: &State, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, ChainError> {
        if let Some(amounts) = &state.amounts_override {
            return Ok(amounts.clone());
        }
        let mut amounts = vec![amount_in];
        for hop in path.windows(2) {
            let pair = Self::pair_for(state, hop[0], hop[1])
                .and_then(|p| state.pairs.get(&p))
                .ok_or_else(|| revert("UniswapV2Library: INSUFFICIENT_LIQUIDITY"))?;
            let (reserve_in, reserve_out) = if pair.token0 == hop[0] {
                (pair.reserve0, pair.reserve1)
            } else {
                (pair.reserve1, pair.reserve0)
            };
            let last = amounts[amounts.len() - 1];
            let with_fee = last * U256::from(997);
            let out = with_fee * reserve_out / (reserve_in * U256::from(1000) + with_fee);
            amounts.push(out);
        }
        Ok(amounts)
    }

    fn answer(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let state = self.state.lock().unwrap();
        if state.failing.contains(&to) {
            return Err(ChainError::Rpc("eth_call failed: header not found".into()));
        }
        let args = &data[4.min(data.len())..];

        if to == factory() {
            if is(data, contracts::GET_PAIR) {
                let tokens = decode(&[ParamType::Address, ParamType::Address], args).unwrap();
                let (a, b) = match (&tokens[0], &tokens[1]) {
                    (Token::Address(a), Token::Address(b)) => (*a, *b),
                    _ => unreachable!(),
                };
                let pair = Self::pair_for(&state, a, b).unwrap_or_default();
                return Ok(encode(&[Token::Address(pair)]));
            }
            if is(data, contracts::ALL_PAIRS_LENGTH) {
                return Ok(encode(&[Token::Uint(U256::from(state.pair_list.len()))]));
            }
            if is(data, contracts::ALL_PAIRS) {
                let tokens = decode(&[ParamType::Uint(256)], args).unwrap();
                let index = match &tokens[0] {
                    Token::Uint(i) => i.as_usize(),
                    _ => unreachable!(),
                };
                let pair = state
                    .pair_list
                    .get(index)
                    .copied()
                    .ok_or_else(|| revert("index out of range"))?;
                return Ok(encode(&[Token::Address(pair)]));
            }
        }

        if let Some(pair) = state.pairs.get(&to) {
            if is(data, contracts::GET_RESERVES) {
                return Ok(encode(&[
                    Token::Uint(pair.reserve0),
                    Token::Uint(pair.reserve1),
                    Token::Uint(U256::zero()),
                ]));
            }
            if is(data, contracts::TOKEN0) {
                return Ok(encode(&[Token::Address(pair.token0)]));
            }
            if is(data, contracts::TOKEN1) {
                return Ok(encode(&[Token::Address(pair.token1)]));
            }
        }

        if to == router() && is(data, contracts::GET_AMOUNTS_OUT) {
            let tokens = decode(
                &[
                    ParamType::Uint(256),
                    ParamType::Array(Box::new(ParamType::Address)),
                ],
                args,
            )
            .unwrap();
            let (amount_in, path) = match (&tokens[0], &tokens[1]) {
                (Token::Uint(a), Token::Array(p)) => (
                    *a,
                    p.iter()
                        .filter_map(|t| t.clone().into_address())
                        .collect::<Vec<_>>(),
                ),
                _ => unreachable!(),
            };
            let amounts = Self::amounts_out(&state, amount_in, &path)?;
            return Ok(encode(&[Token::Array(
                amounts.into_iter().map(Token::Uint).collect(),
            )]));
        }

        if let Some(token) = state.tokens.get(&to) {
            if is(data, contracts::DECIMALS) {
                return Ok(encode(&[Token::Uint(U256::from(token.decimals))]));
            }
            if is(data, contracts::SYMBOL) {
                return Ok(encode(&[Token::String(token.symbol.clone())]));
            }
            if is(data, contracts::BALANCE_OF) {
                let owner = decode(&[ParamType::Address], args).unwrap()[0]
                    .clone()
                    .into_address()
                    .unwrap();
                let balance = token.balances.get(&owner).copied().unwrap_or_default();
                return Ok(encode(&[Token::Uint(balance)]));
            }
            if is(data, contracts::ALLOWANCE) {
                let tokens = decode(&[ParamType::Address, ParamType::Address], args).unwrap();
                let owner = tokens[0].clone().into_address().unwrap();
                let spender = tokens[1].clone().into_address().unwrap();
                let allowance = token
                    .allowances
                    .get(&(owner, spender))
                    .copied()
                    .unwrap_or_default();
                return Ok(encode(&[Token::Uint(allowance)]));
            }
        }

        Err(revert("function selector was not recognized"))
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.answer(to, &data).map(Bytes::from)
    }

    async fn balance(&self, owner: Address) -> Result<U256, ChainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .native
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn code(&self, address: Address) -> Result<Bytes, ChainError> {
        let state = self.state.lock().unwrap();
        let deployed = address == factory()
            || address == router()
            || state.tokens.contains_key(&address)
            || state.pairs.contains_key(&address);
        Ok(if deployed {
            Bytes::from(vec![0x60, 0x80])
        } else {
            Bytes::default()
        })
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<U256, ChainError> {
        let state = self.state.lock().unwrap();
        match &state.estimate_error {
            Some(msg) => Err(ChainError::Rpc(format!("eth_estimateGas failed: {}", msg))),
            None => Ok(state.gas_estimate),
        }
    }

    async fn send_transaction(
        &self,
        signer: &LocalWallet,
        tx: TransactionRequest,
    ) -> Result<H256, ChainError> {
        let mut state = self.state.lock().unwrap();
        let from = signer.address();
        let to = tx
            .to
            .as_ref()
            .and_then(|t| t.as_address())
            .copied()
            .unwrap_or_default();
        let data = tx.data.clone().unwrap_or_default();

        let mut success = true;
        if is(&data, contracts::APPROVE) {
            let tokens = decode(&[ParamType::Address, ParamType::Uint(256)], &data[4..]).unwrap();
            let spender = tokens[0].clone().into_address().unwrap();
            let amount = tokens[1].clone().into_uint().unwrap();
            if let Some(token) = state.tokens.get_mut(&to) {
                token.allowances.insert((from, spender), amount);
            }
        } else if state.swap_reverts {
            success = false;
        }

        state.sent.push(SentTx {
            from,
            to,
            data,
            value: tx.value,
            gas: tx.gas,
        });
        let hash = H256::from_low_u64_be(state.sent.len() as u64);
        if !state.receipts_stall || is(&state.sent[state.sent.len() - 1].data, contracts::APPROVE) {
            state.receipts.insert(hash, success);
        }
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError> {
        let state = self.state.lock().unwrap();
        let success = state
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or(ChainError::ReceiptTimeout(tx_hash))?;
        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(1)),
            gas_used: Some(U256::from(90_000)),
            status: Some(U64::from(if success { 1 } else { 0 })),
            ..Default::default()
        })
    }
}
