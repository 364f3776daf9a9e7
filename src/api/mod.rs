//! # API Module
//!
//! HTTP surface of the server. Everything lives under `/api`.
//!
//! ## Available Endpoints
//!
//! - `GET /api/health` - Liveness plus the configured routers
//! - `POST /api/rpc` - MCP JSON-RPC over HTTP, same tools as stdio mode
//! - `GET /api/balance/:address` - Native balance
//! - `GET /api/pool/:token_a/:token_b?router=` - Pool reserves for a pair

pub mod balance;
pub mod health;
pub mod pool;
pub mod rpc;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// The full application router with state attached.
pub fn create_router(state: AppState) -> Router {
    let api_router = Router::new()
        // Health check
        .route("/health", get(health::health_handler))
        // Chain data
        .route("/balance/:address", get(balance::get_balance_handler))
        .route("/pool/:token_a/:token_b", get(pool::get_pool_handler))
        // JSON-RPC endpoint for MCP tool calls
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
