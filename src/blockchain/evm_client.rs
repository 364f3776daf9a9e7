// src/blockchain/evm_client.rs

use crate::blockchain::client::{ChainClient, ChainError};
use async_trait::async_trait;
use ethers_core::types::{
    Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256, U64,
};
use ethers_signers::{LocalWallet, Signer};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// JSON-RPC client for a single EVM network.
///
/// Holds no chain state. Every nonce, gas price and receipt is fetched from
/// the node on demand.
#[derive(Clone)]
pub struct EvmClient {
    http: Client,
    rpc_url: String,
    chain_id: Option<u64>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl EvmClient {
    /// Create a new EvmClient for the given RPC URL
    pub fn new(rpc_url: &str) -> Self {
        Self {
            http: Client::new(),
            rpc_url: rpc_url.to_string(),
            chain_id: None,
            receipt_timeout: Duration::from_secs(180),
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Pin the EIP-155 chain id instead of asking the node for it on each send.
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_receipt_polling(mut self, timeout: Duration, interval: Duration) -> Self {
        self.receipt_timeout = timeout;
        self.poll_interval = interval;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response: Value = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(ChainError::Rpc(rpc_error_text(method, err)));
        }

        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn request_quantity(&self, method: &str, params: Value) -> Result<U256, ChainError> {
        let result = self.request(method, params).await?;
        parse_quantity(method, &result)
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        if let Some(id) = self.chain_id {
            return Ok(id);
        }
        let result = self.request("eth_chainId", json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| ChainError::decode("eth_chainId", "result is not a string"))?;
        let id = U64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| ChainError::decode("eth_chainId", e))?;
        Ok(id.as_u64())
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256, ChainError> {
        self.request_quantity(
            "eth_getTransactionCount",
            json!([format!("{:?}", address), "pending"]),
        )
        .await
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.request_quantity("eth_gasPrice", json!([])).await
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": format!("{:?}", to), "data": data }, "latest"]),
            )
            .await?;
        parse_bytes("eth_call", &result)
    }

    async fn balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.request_quantity("eth_getBalance", json!([format!("{:?}", owner), "latest"]))
            .await
    }

    async fn code(&self, address: Address) -> Result<Bytes, ChainError> {
        let result = self
            .request("eth_getCode", json!([format!("{:?}", address), "latest"]))
            .await?;
        parse_bytes("eth_getCode", &result)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, ChainError> {
        let call_obj =
            serde_json::to_value(tx).map_err(|e| ChainError::decode("transaction request", e))?;
        self.request_quantity("eth_estimateGas", json!([call_obj])).await
    }

    async fn send_transaction(
        &self,
        signer: &LocalWallet,
        tx_request: TransactionRequest,
    ) -> Result<H256, ChainError> {
        let from_address = signer.address();
        let nonce = self.pending_nonce(from_address).await?;
        let chain_id = self.chain_id().await?;

        let mut tx = tx_request
            .from(from_address)
            .nonce(nonce)
            .chain_id(chain_id);

        // If gas is not provided, estimate it via eth_estimateGas
        if tx.gas.is_none() {
            let gas = self.estimate_gas(&tx).await?;
            tx = tx.gas(gas);
        }
        if tx.gas_price.is_none() {
            let gas_price = self.gas_price().await?;
            tx = tx.gas_price(gas_price);
        }

        let signature = signer
            .sign_transaction(&tx.clone().into())
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        let raw_tx = tx.rlp_signed(&signature);

        debug!("Broadcasting tx from {:?} with nonce {}", from_address, nonce);
        let result = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw_tx))]),
            )
            .await?;

        let hash = result
            .as_str()
            .ok_or_else(|| ChainError::decode("eth_sendRawTransaction", "missing tx hash"))?;
        let tx_hash: H256 = hash
            .parse()
            .map_err(|e| ChainError::decode("eth_sendRawTransaction", e))?;
        info!("Submitted transaction {:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError> {
        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            match self
                .request("eth_getTransactionReceipt", json!([format!("{:?}", tx_hash)]))
                .await
            {
                Ok(Value::Null) => {}
                Ok(value) => {
                    return serde_json::from_value(value)
                        .map_err(|e| ChainError::decode("transaction receipt", e));
                }
                // Polling a receipt is a read; a dropped poll is not a resubmission.
                Err(e) => warn!("Receipt poll for {:?} failed: {}", tx_hash, e),
            }

            if Instant::now() >= deadline {
                return Err(ChainError::ReceiptTimeout(tx_hash));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn rpc_error_text(method: &str, err: &Value) -> String {
    let message = err
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    match err.get("data").and_then(|d| d.as_str()) {
        Some(data) if !data.is_empty() => format!("{} failed: {} ({})", method, message, data),
        _ => format!("{} failed: {}", method, message),
    }
}

fn parse_quantity(method: &str, value: &Value) -> Result<U256, ChainError> {
    let hex = value
        .as_str()
        .ok_or_else(|| ChainError::decode(method, format!("expected hex quantity, got {}", value)))?;
    U256::from_str_radix(hex.trim_start_matches("0x"), 16).map_err(|e| ChainError::decode(method, e))
}

fn parse_bytes(method: &str, value: &Value) -> Result<Bytes, ChainError> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainError::decode(method, "result not string"))?;
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s)
        .map(Bytes::from)
        .map_err(|e| ChainError::decode(method, e))
}
