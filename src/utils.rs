//! Argument helpers for MCP tool handlers

use crate::mcp::protocol::{error_codes, Response};
use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

/// Helper function to extract a required argument from a JSON object
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null)).map_err(|_| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid required argument: '{}'", key),
        )
    })
}

/// Like [`get_required_arg`] but absent or `null` is `Ok(None)`.
pub fn get_optional_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<Option<T>, Response> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => from_value(v.clone()).map(Some).map_err(|_| {
            Response::error(
                req_id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Invalid argument: '{}'", key),
            )
        }),
    }
}

/// Decimal text of a string or integer argument. JSON numbers with a
/// fraction are parsed as `f64` and may already be rounded, so they are
/// rejected: `"0.5"` is accepted, `0.5` is not.
pub fn get_numeric_text(args: &Value, key: &str, req_id: &Value) -> Result<Option<String>, Response> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(Some(n.to_string())),
        Some(Value::Number(_)) => Err(Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Argument '{}' has a fraction; pass it as a decimal string, e.g. \"0.5\"", key),
        )),
        Some(_) => Err(Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Argument '{}' must be a number or a decimal string", key),
        )),
    }
}
