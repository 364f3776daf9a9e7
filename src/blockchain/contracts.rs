//! Typed bindings for the four contract roles the swap engine talks to.
//!
//! Each binding is a borrowed view over a [`ChainClient`] plus an address and
//! is meant to be built per call. Method signatures are fixed at compile time;
//! encoding and decoding go through `ethers_core::abi`.

use crate::blockchain::{
    abi::{decode_address, decode_output, decode_string, decode_u256, encode_call},
    client::{ChainClient, ChainError},
};
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, TransactionRequest, U256};

pub const GET_PAIR: &str = "getPair(address,address)";
pub const ALL_PAIRS_LENGTH: &str = "allPairsLength()";
pub const ALL_PAIRS: &str = "allPairs(uint256)";
pub const GET_RESERVES: &str = "getReserves()";
pub const TOKEN0: &str = "token0()";
pub const TOKEN1: &str = "token1()";
pub const GET_AMOUNTS_OUT: &str = "getAmountsOut(uint256,address[])";
pub const SWAP_EXACT_ETH_FOR_TOKENS: &str =
    "swapExactETHForTokens(uint256,address[],address,uint256)";
pub const SWAP_EXACT_TOKENS_FOR_ETH: &str =
    "swapExactTokensForETH(uint256,uint256,address[],address,uint256)";
pub const SWAP_EXACT_TOKENS_FOR_TOKENS: &str =
    "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)";
pub const DECIMALS: &str = "decimals()";
pub const SYMBOL: &str = "symbol()";
pub const BALANCE_OF: &str = "balanceOf(address)";
pub const ALLOWANCE: &str = "allowance(address,address)";
pub const APPROVE: &str = "approve(address,uint256)";

fn path_token(path: &[Address]) -> Token {
    Token::Array(path.iter().copied().map(Token::Address).collect())
}

/// V2 pair factory.
pub struct FactoryContract<'a> {
    client: &'a dyn ChainClient,
    pub address: Address,
}

impl<'a> FactoryContract<'a> {
    pub fn new(client: &'a dyn ChainClient, address: Address) -> Self {
        Self { client, address }
    }

    /// Pair address for the two tokens, `Address::zero()` when none exists.
    pub async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Address, ChainError> {
        let data = encode_call(GET_PAIR, &[Token::Address(token_a), Token::Address(token_b)]);
        let raw = self.client.call(self.address, data).await?;
        decode_address("getPair", &raw)
    }

    pub async fn all_pairs_length(&self) -> Result<U256, ChainError> {
        let raw = self.client.call(self.address, encode_call(ALL_PAIRS_LENGTH, &[])).await?;
        decode_u256("allPairsLength", &raw)
    }

    pub async fn all_pairs(&self, index: U256) -> Result<Address, ChainError> {
        let data = encode_call(ALL_PAIRS, &[Token::Uint(index)]);
        let raw = self.client.call(self.address, data).await?;
        decode_address("allPairs", &raw)
    }
}

/// V2 liquidity pair.
pub struct PairContract<'a> {
    client: &'a dyn ChainClient,
    pub address: Address,
}

impl<'a> PairContract<'a> {
    pub fn new(client: &'a dyn ChainClient, address: Address) -> Self {
        Self { client, address }
    }

    /// `(reserve0, reserve1)` in the pair's own token order.
    pub async fn get_reserves(&self) -> Result<(U256, U256), ChainError> {
        let raw = self.client.call(self.address, encode_call(GET_RESERVES, &[])).await?;
        let tokens = decode_output(
            "getReserves",
            &[ParamType::Uint(112), ParamType::Uint(112), ParamType::Uint(32)],
            &raw,
        )?;
        match (tokens.first(), tokens.get(1)) {
            (Some(Token::Uint(r0)), Some(Token::Uint(r1))) => Ok((*r0, *r1)),
            _ => Err(ChainError::decode("getReserves", "expected two uint112 reserves")),
        }
    }

    pub async fn token0(&self) -> Result<Address, ChainError> {
        let raw = self.client.call(self.address, encode_call(TOKEN0, &[])).await?;
        decode_address("token0", &raw)
    }

    pub async fn token1(&self) -> Result<Address, ChainError> {
        let raw = self.client.call(self.address, encode_call(TOKEN1, &[])).await?;
        decode_address("token1", &raw)
    }
}

/// V2 router: multi-hop quoting and the three exact-input swap entry points.
pub struct RouterContract<'a> {
    client: &'a dyn ChainClient,
    pub address: Address,
}

impl<'a> RouterContract<'a> {
    pub fn new(client: &'a dyn ChainClient, address: Address) -> Self {
        Self { client, address }
    }

    pub async fn get_amounts_out(
        &self,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ChainError> {
        let data = encode_call(GET_AMOUNTS_OUT, &[Token::Uint(amount_in), path_token(path)]);
        let raw = self.client.call(self.address, data).await?;
        let tokens = decode_output(
            "getAmountsOut",
            &[ParamType::Array(Box::new(ParamType::Uint(256)))],
            &raw,
        )?;
        match tokens.into_iter().next() {
            Some(Token::Array(items)) => items
                .into_iter()
                .map(|t| match t {
                    Token::Uint(n) => Ok(n),
                    other => Err(ChainError::decode("getAmountsOut", format!("{:?}", other))),
                })
                .collect(),
            other => Err(ChainError::decode("getAmountsOut", format!("{:?}", other))),
        }
    }

    /// Native coin in; `amount_in` travels as the transaction value.
    pub fn swap_exact_eth_for_tokens_tx(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: U256,
    ) -> TransactionRequest {
        let data = encode_call(
            SWAP_EXACT_ETH_FOR_TOKENS,
            &[
                Token::Uint(amount_out_min),
                path_token(path),
                Token::Address(to),
                Token::Uint(deadline),
            ],
        );
        TransactionRequest::new()
            .to(self.address)
            .data(data)
            .value(amount_in)
    }

    pub fn swap_exact_tokens_for_eth_tx(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: U256,
    ) -> TransactionRequest {
        let data = encode_call(
            SWAP_EXACT_TOKENS_FOR_ETH,
            &[
                Token::Uint(amount_in),
                Token::Uint(amount_out_min),
                path_token(path),
                Token::Address(to),
                Token::Uint(deadline),
            ],
        );
        TransactionRequest::new().to(self.address).data(data)
    }

    pub fn swap_exact_tokens_for_tokens_tx(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: U256,
    ) -> TransactionRequest {
        let data = encode_call(
            SWAP_EXACT_TOKENS_FOR_TOKENS,
            &[
                Token::Uint(amount_in),
                Token::Uint(amount_out_min),
                path_token(path),
                Token::Address(to),
                Token::Uint(deadline),
            ],
        );
        TransactionRequest::new().to(self.address).data(data)
    }
}

/// ERC-20 token.
pub struct TokenContract<'a> {
    client: &'a dyn ChainClient,
    pub address: Address,
}

impl<'a> TokenContract<'a> {
    pub fn new(client: &'a dyn ChainClient, address: Address) -> Self {
        Self { client, address }
    }

    pub async fn decimals(&self) -> Result<u8, ChainError> {
        let raw = self.client.call(self.address, encode_call(DECIMALS, &[])).await?;
        let n = decode_u256("decimals", &raw)?;
        if n > U256::from(u8::MAX) {
            return Err(ChainError::decode("decimals", format!("{} does not fit in uint8", n)));
        }
        Ok(n.as_u32() as u8)
    }

    pub async fn symbol(&self) -> Result<String, ChainError> {
        let raw = self.client.call(self.address, encode_call(SYMBOL, &[])).await?;
        decode_string(&raw).ok_or_else(|| ChainError::decode("symbol", "not a string or bytes32"))
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ChainError> {
        let data = encode_call(BALANCE_OF, &[Token::Address(owner)]);
        let raw = self.client.call(self.address, data).await?;
        decode_u256("balanceOf", &raw)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        let data = encode_call(ALLOWANCE, &[Token::Address(owner), Token::Address(spender)]);
        let raw = self.client.call(self.address, data).await?;
        decode_u256("allowance", &raw)
    }

    pub fn approve_tx(&self, spender: Address, amount: U256) -> TransactionRequest {
        let data = encode_call(APPROVE, &[Token::Address(spender), Token::Uint(amount)]);
        TransactionRequest::new().to(self.address).data(data)
    }
}
