use crate::{
    blockchain::{models::BalanceResponse, to_checksum},
    swap::{parse_address, units::format_units},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::error;

// The handler function for the GET /balance/{address} endpoint.
pub async fn get_balance_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let owner = match parse_address("address", &address) {
        Ok(owner) => owner,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.chain.balance(owner).await {
        Ok(wei) => {
            let output = BalanceResponse {
                address: to_checksum(&owner, None),
                amount: wei.to_string(),
                formatted: format_units(wei, 18),
                symbol: state.config.native_symbol.clone(),
            };
            (StatusCode::OK, Json(output)).into_response()
        }
        Err(e) => {
            error!("Failed to get balance for {}: {:?}", address, e);
            (
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch balance: {}", e),
            )
                .into_response()
        }
    }
}
