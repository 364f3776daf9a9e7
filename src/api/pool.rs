use crate::{
    blockchain::models::PoolSummary,
    swap::{parse_address, pool::PoolResolver},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

// Path segments for GET /pool/{token_a}/{token_b}.
#[derive(Debug, Deserialize)]
pub struct PoolPath {
    pub token_a: String,
    pub token_b: String,
}

#[derive(Debug, Deserialize)]
pub struct PoolQuery {
    pub router: Option<String>,
}

// Reserves for one pair, in the order the tokens appear in the path.
pub async fn get_pool_handler(
    Path(path): Path<PoolPath>,
    Query(query): Query<PoolQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let dex = match state.config.dex_context(query.router.as_deref()) {
        Ok(dex) => dex,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    let (token_a, token_b) = match (
        parse_address("token_a", &path.token_a),
        parse_address("token_b", &path.token_b),
    ) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let pool = PoolResolver::new(state.chain.as_ref(), dex.factory)
        .check_liquidity(token_a, token_b)
        .await;
    (StatusCode::OK, Json(PoolSummary::from_pool(&pool, dex.reserve_floor))).into_response()
}
