// src/blockchain/abi.rs

use crate::blockchain::client::ChainError;
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, U256};
use ethers_core::utils::keccak256;

pub fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

pub fn encode_call(sig: &str, tokens: &[Token]) -> Bytes {
    let mut out = selector(sig).to_vec();
    let mut tail = encode(tokens);
    out.append(&mut tail);
    Bytes::from(out)
}

pub fn decode_output(what: &str, types: &[ParamType], data: &Bytes) -> Result<Vec<Token>, ChainError> {
    decode(types, data).map_err(|e| ChainError::decode(what, e))
}

pub fn decode_u256(what: &str, data: &Bytes) -> Result<U256, ChainError> {
    match decode_output(what, &[ParamType::Uint(256)], data)?.into_iter().next() {
        Some(Token::Uint(n)) => Ok(n),
        other => Err(ChainError::decode(what, format!("unexpected token {:?}", other))),
    }
}

pub fn decode_address(what: &str, data: &Bytes) -> Result<Address, ChainError> {
    match decode_output(what, &[ParamType::Address], data)?.into_iter().next() {
        Some(Token::Address(a)) => Ok(a),
        other => Err(ChainError::decode(what, format!("unexpected token {:?}", other))),
    }
}

/// Decodes an ABI `string`, falling back to a NUL-padded `bytes32` as some
/// older tokens return from `symbol()`.
pub fn decode_string(data: &Bytes) -> Option<String> {
    if let Ok(tokens) = decode(&[ParamType::String], data) {
        if let Some(Token::String(s)) = tokens.into_iter().next() {
            return Some(s);
        }
    }
    if let Ok(tokens) = decode(&[ParamType::FixedBytes(32)], data) {
        if let Some(Token::FixedBytes(b)) = tokens.into_iter().next() {
            let trimmed: Vec<u8> = b.into_iter().take_while(|c| *c != 0u8).collect();
            if !trimmed.is_empty() {
                return String::from_utf8(trimmed).ok();
            }
        }
    }
    None
}
