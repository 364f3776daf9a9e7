//! MCP dispatcher and HTTP routes.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request as HttpRequest, StatusCode},
};
use common::*;
use ethers_core::types::{Address, U256};
use ethers_signers::Signer;
use evm_swap_mcp::{
    api::create_router,
    config::Config,
    mcp::{
        handler::handle_mcp_request,
        protocol::{error_codes, Request, Response},
    },
    AppState,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

fn tka() -> Address {
    addr(0xa1)
}

fn tkb() -> Address {
    addr(0xb2)
}

fn hex(a: Address) -> String {
    format!("{:?}", a)
}

fn test_state(chain: Arc<FakeChain>) -> AppState {
    let routers = json!({
        "testswap": { "router": hex(router()), "factory": hex(factory()) }
    });
    let vars: HashMap<&str, String> = [
        ("RPC_URL", "http://localhost:8545".to_string()),
        ("BASE_ASSET_ADDRESS", hex(base())),
        ("DEX_ROUTERS", routers.to_string()),
        ("TX_PRIVATE_KEY", SIGNER_KEY.to_string()),
    ]
    .into_iter()
    .collect();
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    AppState::new(config, chain)
}

fn funded_chain() -> Arc<FakeChain> {
    let chain = FakeChain::new();
    chain.add_token(tka(), "TKA", 18);
    chain.add_token(tkb(), "TKB", 18);
    chain.add_pair(tka(), tkb(), eth(100), eth(100));
    chain.set_balance(tka(), signer().address(), eth(10));
    Arc::new(chain)
}

fn call(id: i64, name: &str, arguments: Value) -> Request {
    Request {
        jsonrpc: "2.0".into(),
        id: json!(id),
        method: "tools/call".into(),
        params: Some(json!({ "name": name, "arguments": arguments })),
    }
}

async fn dispatch(state: &AppState, req: Request) -> Response {
    handle_mcp_request(req, state.clone()).await.unwrap()
}

#[tokio::test]
async fn tools_list_names_every_tool() {
    let state = test_state(funded_chain());
    let req = Request {
        jsonrpc: "2.0".into(),
        id: json!(1),
        method: "tools/list".into(),
        params: None,
    };
    let resp = dispatch(&state, req).await;
    let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
    let names: Vec<String> = tools
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 7);
    assert!(names.contains(&"swap_tokens".to_string()));
    assert!(names.contains(&"list_pools".to_string()));
}

#[tokio::test]
async fn notifications_get_no_response() {
    let state = test_state(funded_chain());
    let req = Request {
        jsonrpc: "2.0".into(),
        id: Value::Null,
        method: "notifications/initialized".into(),
        params: None,
    };
    assert!(handle_mcp_request(req, state).await.is_none());
}

#[tokio::test]
async fn unknown_method_is_a_protocol_error() {
    let state = test_state(funded_chain());
    let req = Request {
        jsonrpc: "2.0".into(),
        id: json!(9),
        method: "transfer_evm".into(),
        params: None,
    };
    let resp = dispatch(&state, req).await;
    assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn swap_tokens_executes_with_configured_key() {
    let chain = funded_chain();
    let state = test_state(chain.clone());
    let resp = dispatch(
        &state,
        call(
            2,
            "swap_tokens",
            json!({ "token_in": hex(tka()), "token_out": hex(tkb()), "amount_in": 1, "slippage_percent": "0.5" }),
        ),
    )
    .await;

    let result = resp.result.unwrap();
    assert_eq!(result["success"], json!(true), "{}", result);
    assert!(result["tx_hash"].is_string());
    assert!(result["approval_tx_hash"].is_string());
    assert!(result["content"][0]["text"].as_str().unwrap().contains("Swapped"));
    assert_eq!(chain.sent().len(), 2);
}

#[tokio::test]
async fn swap_failures_are_results_not_errors() {
    let chain = funded_chain();
    let state = test_state(chain.clone());
    let resp = dispatch(
        &state,
        call(
            3,
            "swap_tokens",
            json!({ "token_in": hex(tka()), "token_out": hex(tkb()), "amount_in": "500" }),
        ),
    )
    .await;

    assert!(resp.error.is_none());
    let result = resp.result.unwrap();
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"]["kind"], json!("insufficient_balance"));
    assert!(result["error"]["suggestion"].is_string());
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn malformed_swap_call_is_invalid_params() {
    let state = test_state(funded_chain());
    let resp = dispatch(&state, call(4, "swap_tokens", json!({ "token_out": hex(tkb()) }))).await;
    assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);

    let resp = dispatch(
        &state,
        call(5, "swap_tokens", json!({ "token_out": hex(tkb()), "amount_in": "1", "router": "nope" })),
    )
    .await;
    let err = resp.error.unwrap();
    assert_eq!(err.code, error_codes::INVALID_PARAMS);
    assert!(err.message.contains("testswap"));
}

#[tokio::test]
async fn quote_alias_never_sends() {
    let chain = funded_chain();
    let state = test_state(chain.clone());
    let req = Request {
        jsonrpc: "2.0".into(),
        id: json!(6),
        method: "get_swap_quote".into(),
        params: Some(json!({ "token_in": hex(tka()), "token_out": hex(tkb()), "amount_in": "2" })),
    };
    let result = dispatch(&state, req).await.result.unwrap();
    assert_eq!(result["success"], json!(true), "{}", result);
    assert!(result["estimated_amount_out"].is_string());
    assert!(result.get("tx_hash").is_none());
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn fractional_json_amounts_are_rejected_not_rounded() {
    let chain = funded_chain();
    let state = test_state(chain.clone());
    let resp = dispatch(
        &state,
        call(
            11,
            "get_swap_quote",
            json!({ "token_in": hex(tka()), "token_out": hex(tkb()), "amount_in": 1.123456789123456789 }),
        ),
    )
    .await;
    let err = resp.error.unwrap();
    assert_eq!(err.code, error_codes::INVALID_PARAMS);
    assert!(err.message.contains("amount_in"));

    let resp = dispatch(
        &state,
        call(
            12,
            "get_swap_quote",
            json!({ "token_in": hex(tka()), "token_out": hex(tkb()), "amount_in": "1.123456789123456789" }),
        ),
    )
    .await;
    let result = resp.result.unwrap();
    assert_eq!(result["amount_in"], json!("1.123456789123456789"), "{}", result);
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn check_liquidity_reports_reserves() {
    let state = test_state(funded_chain());
    let resp = dispatch(
        &state,
        call(7, "check_liquidity", json!({ "token_a": hex(tkb()), "token_b": hex(tka()) })),
    )
    .await;
    let result = resp.result.unwrap();
    assert_eq!(result["exists"], json!(true));
    assert_eq!(result["viable"], json!(true));
    assert_eq!(result["token_a"]["symbol"], json!("TKB"));
    assert_eq!(result["token_a"]["formatted"], json!("100"));
}

#[tokio::test]
async fn token_balance_is_formatted() {
    let state = test_state(funded_chain());
    let resp = dispatch(
        &state,
        call(
            8,
            "get_token_balance",
            json!({ "token_address": hex(tka()), "owner_address": hex(signer().address()) }),
        ),
    )
    .await;
    let result = resp.result.unwrap();
    assert_eq!(result["formatted"], json!("10"));
    assert_eq!(result["raw"], json!(eth(10).to_string()));
}

#[tokio::test]
async fn native_balance_tool_reads_the_chain() {
    let chain = funded_chain();
    chain.set_native_balance(addr(0x5), U256::from(25) * U256::exp10(17));
    let state = test_state(chain);
    let resp = dispatch(&state, call(10, "get_balance", json!({ "address": hex(addr(0x5)) }))).await;
    let result = resp.result.unwrap();
    assert_eq!(result["formatted"], json!("2.5"));
    assert_eq!(result["symbol"], json!("ETH"));
}

#[tokio::test]
async fn health_route_lists_routers() {
    let app = create_router(test_state(funded_chain()));
    let response = app
        .oneshot(
            HttpRequest::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["routers"], json!(["testswap"]));
}

#[tokio::test]
async fn rpc_route_forwards_to_the_dispatcher() {
    let app = create_router(test_state(funded_chain()));
    let payload = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" });
    let response = app
        .oneshot(
            HttpRequest::builder()
                .method(Method::POST)
                .uri("/api/rpc")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["result"]["serverInfo"]["name"], "evm_swap_mcp");
}

#[tokio::test]
async fn pool_route_rejects_bad_addresses() {
    let app = create_router(test_state(funded_chain()));
    let response = app
        .oneshot(
            HttpRequest::builder()
                .uri(format!("/api/pool/0x12/{}", hex(tka())))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
