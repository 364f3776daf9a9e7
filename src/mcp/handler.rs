//! # MCP Handler Module
//!
//! Implements the Model Context Protocol dispatcher: `initialize`,
//! `tools/list` and `tools/call`, plus direct method aliases for each tool.
//!
//! ## Supported Tools
//!
//! ### Swaps
//! - `swap_tokens` - Resolve, quote, approve and execute a swap
//! - `get_swap_quote` - Quote a swap without sending anything
//!
//! ### Pools
//! - `check_liquidity` - Reserves for one pair
//! - `list_pools` - Page through a factory's pairs
//!
//! ### Reads
//! - `get_balance` - Native balance
//! - `get_token_info` - ERC-20 metadata
//! - `get_token_balance` - ERC-20 balance
//!
//! Swap failures come back as a successful JSON-RPC response whose result
//! has `success: false` and a classified error. JSON-RPC errors are only for
//! calls that could not be understood.

use crate::{
    blockchain::{
        contracts::TokenContract,
        models::{BalanceResponse, PoolListResponse, PoolSummary, TokenBalanceResponse, TokenInfoResponse},
        to_checksum,
    },
    mcp::{
        protocol::{error_codes, Request, Response},
        tools::{tool_definitions, TOOL_NAMES},
    },
    swap::{
        parse_address, pool::PoolResolver, token::resolve_token, units::format_units, DexContext,
        SwapOutcome, SwapRequest, SwapService,
    },
    utils, AppState,
};
use ethers_core::types::Address;
use ethers_signers::{LocalWallet, Signer};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{error, info};

const DEFAULT_POOL_PAGE: u64 = 10;
const MAX_POOL_PAGE: u64 = 50;

// Helper: produce a result Value that always contains a text content array
// and preserves structured data for JSON-friendly clients.
fn make_texty_result(text: String, payload: Value) -> Value {
    let content = json!([{ "type": "text", "text": text }]);
    match payload {
        Value::Object(mut map) => {
            // Do not overwrite if caller already set content
            if !map.contains_key("content") {
                map.insert("content".into(), content);
            }
            Value::Object(map)
        }
        other => json!({
            "data": other,
            "content": content
        }),
    }
}

fn to_payload<T: Serialize>(value: &T, req_id: &Value) -> Result<Value, Response> {
    serde_json::to_value(value).map_err(|e| {
        Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, e.to_string())
    })
}

fn outcome_response(outcome: &SwapOutcome, req_id: &Value) -> Result<Response, Response> {
    let payload = to_payload(outcome, req_id)?;
    Ok(Response::success(
        req_id.clone(),
        make_texty_result(outcome.summary.clone(), payload),
    ))
}

fn invalid_params(req_id: &Value, message: String) -> Response {
    Response::error(req_id.clone(), error_codes::INVALID_PARAMS, message)
}

fn internal_error(req_id: &Value, message: String) -> Response {
    Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, message)
}

fn address_arg(args: &Value, key: &str, req_id: &Value) -> Result<Address, Response> {
    let raw = utils::get_required_arg::<String>(args, key, req_id)?;
    parse_address(key, &raw).map_err(|e| invalid_params(req_id, e.to_string()))
}

fn dex_context(state: &AppState, args: &Value, req_id: &Value) -> Result<DexContext, Response> {
    let router = utils::get_optional_arg::<String>(args, "router", req_id)?;
    state
        .config
        .dex_context(router.as_deref())
        .map_err(|msg| invalid_params(req_id, msg))
}

fn swap_request(args: &Value, req_id: &Value) -> Result<SwapRequest, Response> {
    Ok(SwapRequest {
        token_in: utils::get_optional_arg(args, "token_in", req_id)?,
        token_out: utils::get_required_arg(args, "token_out", req_id)?,
        amount_in: utils::get_numeric_text(args, "amount_in", req_id)?.ok_or_else(|| {
            invalid_params(req_id, "Missing or invalid required argument: 'amount_in'".into())
        })?,
        slippage_percent: utils::get_numeric_text(args, "slippage_percent", req_id)?,
        deadline: utils::get_optional_arg(args, "deadline", req_id)?,
        use_native_in: utils::get_optional_arg(args, "use_native_in", req_id)?.unwrap_or(false),
        check_liquidity_only: utils::get_optional_arg(args, "check_liquidity_only", req_id)?
            .unwrap_or(false),
        recipient: utils::get_optional_arg(args, "recipient", req_id)?,
    })
}

/// The request's `private_key`, else the server's configured key.
fn resolve_signer(state: &AppState, args: &Value, req_id: &Value) -> Result<LocalWallet, Response> {
    let from_args = utils::get_optional_arg::<String>(args, "private_key", req_id)?;
    let key = match (&from_args, &state.config.tx_private_key) {
        (Some(key), _) => key.as_str(),
        (None, Some(key)) => key.expose_secret().as_str(),
        (None, None) => {
            return Err(invalid_params(
                req_id,
                "No signer: pass 'private_key' or configure TX_PRIVATE_KEY".into(),
            ))
        }
    };
    LocalWallet::from_str(key.trim())
        .map_err(|_| invalid_params(req_id, "private_key is not a valid secp256k1 key".into()))
}

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        // Convenience aliases to support direct method calls from CLI
        // They are rewritten into tools/call internally to reuse the same logic
        name if TOOL_NAMES.contains(&name) => {
            let name = req.method.clone();
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": name,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    let req_id = &req.id;
    let chain = state.chain.as_ref();

    match tool_name {
        "swap_tokens" => {
            let res: Result<Response, Response> = (async {
                let dex = dex_context(&state, args, req_id)?;
                let request = swap_request(args, req_id)?;
                let signer = resolve_signer(&state, args, req_id)?;

                // One swap at a time per signer: the allowance check and the
                // nonce read must not interleave.
                let _guard = state.signer_locks.acquire(signer.address()).await;
                let outcome = SwapService::new(chain, dex).swap(&signer, &request).await;
                outcome_response(&outcome, req_id)
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_swap_quote" => {
            let res: Result<Response, Response> = (async {
                let dex = dex_context(&state, args, req_id)?;
                let mut request = swap_request(args, req_id)?;
                request.check_liquidity_only = true;
                let owner = match utils::get_optional_arg::<String>(args, "owner", req_id)? {
                    Some(raw) => match parse_address("owner", &raw) {
                        Ok(owner) => Some(owner),
                        Err(e) => return outcome_response(&SwapOutcome::failure(&e), req_id),
                    },
                    None => None,
                };
                let outcome = SwapService::new(chain, dex).quote_outcome(&request, owner).await;
                outcome_response(&outcome, req_id)
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "check_liquidity" => {
            let res: Result<Response, Response> = (async {
                let dex = dex_context(&state, args, req_id)?;
                let token_a = address_arg(args, "token_a", req_id)?;
                let token_b = address_arg(args, "token_b", req_id)?;
                let pool = PoolResolver::new(chain, dex.factory)
                    .check_liquidity(token_a, token_b)
                    .await;
                let summary = PoolSummary::from_pool(&pool, dex.reserve_floor);
                let text = if pool.exists {
                    format!(
                        "Pool {} at {}: {} {} / {} {}{}",
                        pool.label(),
                        summary.pair_address,
                        summary.token_a.formatted,
                        pool.token_a.symbol,
                        summary.token_b.formatted,
                        pool.token_b.symbol,
                        if summary.viable { "" } else { " (below the liquidity floor)" }
                    )
                } else {
                    format!("No pool for {}", pool.label())
                };
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(text, to_payload(&summary, req_id)?),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "list_pools" => {
            let res: Result<Response, Response> = (async {
                let dex = dex_context(&state, args, req_id)?;
                let offset = utils::get_optional_arg::<u64>(args, "offset", req_id)?.unwrap_or(0);
                let limit = utils::get_optional_arg::<u64>(args, "limit", req_id)?
                    .unwrap_or(DEFAULT_POOL_PAGE)
                    .clamp(1, MAX_POOL_PAGE);
                let (total, pools) = PoolResolver::new(chain, dex.factory)
                    .list_pools(offset, limit)
                    .await
                    .map_err(|e| {
                        error!("list_pools failed: {}", e);
                        internal_error(req_id, e.to_string())
                    })?;
                let listing = PoolListResponse {
                    factory: to_checksum(&dex.factory, None),
                    total: total.to_string(),
                    offset,
                    pools: pools
                        .iter()
                        .map(|p| PoolSummary::from_pool(p, dex.reserve_floor))
                        .collect(),
                };
                let text = format!(
                    "{} of {} pools from offset {}: {}",
                    listing.pools.len(),
                    listing.total,
                    offset,
                    pools.iter().map(|p| p.label()).collect::<Vec<_>>().join(", ")
                );
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(text, to_payload(&listing, req_id)?),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_balance" => {
            let res: Result<Response, Response> = (async {
                let address = address_arg(args, "address", req_id)?;
                let wei = chain
                    .balance(address)
                    .await
                    .map_err(|e| internal_error(req_id, e.to_string()))?;
                let balance = BalanceResponse {
                    address: to_checksum(&address, None),
                    amount: wei.to_string(),
                    formatted: format_units(wei, 18),
                    symbol: state.config.native_symbol.clone(),
                };
                let text = format!("Balance: {} {}", balance.formatted, balance.symbol);
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(text, to_payload(&balance, req_id)?),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_token_info" => {
            let res: Result<Response, Response> = (async {
                let token = address_arg(args, "token_address", req_id)?;
                let contract = TokenContract::new(chain, token);
                let (decimals, symbol) = futures::join!(contract.decimals(), contract.symbol());
                let info = TokenInfoResponse {
                    symbol: symbol.map_err(|e| internal_error(req_id, e.to_string()))?,
                    decimals: decimals.map_err(|e| internal_error(req_id, e.to_string()))?,
                    contract_address: to_checksum(&token, None),
                };
                let text = format!(
                    "Token {} at {} ({} decimals)",
                    info.symbol, info.contract_address, info.decimals
                );
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(text, to_payload(&info, req_id)?),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_token_balance" => {
            let res: Result<Response, Response> = (async {
                let token = address_arg(args, "token_address", req_id)?;
                let owner = address_arg(args, "owner_address", req_id)?;
                let contract = TokenContract::new(chain, token);
                let (identity, raw) =
                    futures::join!(resolve_token(chain, token), contract.balance_of(owner));
                let raw = raw.map_err(|e| internal_error(req_id, e.to_string()))?;
                let balance = TokenBalanceResponse {
                    contract_address: to_checksum(&token, None),
                    owner: to_checksum(&owner, None),
                    symbol: identity.symbol.clone(),
                    decimals: identity.decimals,
                    raw: raw.to_string(),
                    formatted: identity.format(raw),
                };
                let text = format!(
                    "ERC20 balance of {}: {} {}",
                    balance.owner, balance.formatted, balance.symbol
                );
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(text, to_payload(&balance, req_id)?),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        _ => Response::error(
            req.id.clone(),
            error_codes::METHOD_NOT_FOUND,
            format!("Tool not found: {}", tool_name),
        ),
    }
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "evm_swap_mcp",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "EVM testnet MCP server for token swaps on V2-style DEXes, pool inspection, and balance queries.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    Response::success(req.id.clone(), json!({ "tools": tool_definitions() }))
}
