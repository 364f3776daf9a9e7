use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "routers": state.config.supported_routers(),
        "default_router": state.config.default_router,
    }))
}
