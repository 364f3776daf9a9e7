// src/mcp/tools.rs

use serde_json::{json, Value};

/// Names accepted by `tools/call`.
pub const TOOL_NAMES: &[&str] = &[
    "swap_tokens",
    "get_swap_quote",
    "check_liquidity",
    "list_pools",
    "get_balance",
    "get_token_info",
    "get_token_balance",
];

fn swap_properties() -> Value {
    json!({
        "router": {"type": "string", "description": "Configured router name. Defaults to the server's DEFAULT_ROUTER."},
        "token_in": {"type": "string", "description": "0x address of the token to sell, or 'native' for the native coin."},
        "token_out": {"type": "string", "description": "0x address of the token to buy, or 'native' to receive the native coin."},
        "amount_in": {"type": "string", "description": "Human-readable amount of token_in as a decimal string, e.g. '1.5'. Integer JSON numbers are also accepted."},
        "slippage_percent": {"type": "string", "description": "Slippage tolerance in percent as a decimal string, one decimal max. Default '0.5'."},
        "use_native_in": {"type": "boolean", "description": "Pay with the native coin instead of token_in."}
    })
}

/// JSON definitions returned by `tools/list`.
pub fn tool_definitions() -> Value {
    let mut swap_props = swap_properties();
    if let Some(map) = swap_props.as_object_mut() {
        map.insert("private_key".into(), json!({"type": "string", "description": "Signer key. Defaults to the server's TX_PRIVATE_KEY."}));
        map.insert("deadline".into(), json!({"type": "integer", "description": "Unix timestamp after which the swap reverts. Default now + 300s."}));
        map.insert("check_liquidity_only".into(), json!({"type": "boolean", "description": "Validate and quote without sending any transaction."}));
        map.insert("recipient".into(), json!({"type": "string", "description": "Receiver of the output. Defaults to the signer."}));
    }

    let mut quote_props = swap_properties();
    if let Some(map) = quote_props.as_object_mut() {
        map.insert("owner".into(), json!({"type": "string", "description": "Optional address whose balance is checked against amount_in."}));
    }

    json!([
        {
            "name": "swap_tokens",
            "description": "Swap tokens on a V2-style DEX. Resolves a direct or base-asset route, quotes with slippage protection, approves the router when needed and submits the swap.",
            "inputSchema": {
                "type": "object",
                "properties": swap_props,
                "required": ["token_out", "amount_in"]
            }
        },
        {
            "name": "get_swap_quote",
            "description": "Quote a swap without sending anything: route, estimated output and minimum output after slippage.",
            "inputSchema": {
                "type": "object",
                "properties": quote_props,
                "required": ["token_out", "amount_in"]
            }
        },
        {
            "name": "check_liquidity",
            "description": "Look up the pool for a token pair and report its reserves in the order given.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "token_a": {"type": "string"},
                    "token_b": {"type": "string"},
                    "router": {"type": "string"}
                },
                "required": ["token_a", "token_b"]
            }
        },
        {
            "name": "list_pools",
            "description": "Page through the pairs a router's factory has created.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "router": {"type": "string"},
                    "offset": {"type": "integer", "minimum": 0},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 50}
                }
            }
        },
        {
            "name": "get_balance",
            "description": "Get the native coin balance of an address.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... address to check."}
                },
                "required": ["address"]
            }
        },
        {
            "name": "get_token_info",
            "description": "Get ERC20 token metadata.",
            "inputSchema": {"type": "object", "properties": {"token_address": {"type": "string"}}, "required": ["token_address"], "additionalProperties": false}
        },
        {
            "name": "get_token_balance",
            "description": "Check ERC20 token balance.",
            "inputSchema": {"type": "object", "properties": {"token_address": {"type": "string"}, "owner_address": {"type": "string"}}, "required": ["token_address", "owner_address"], "additionalProperties": false}
        }
    ])
}
