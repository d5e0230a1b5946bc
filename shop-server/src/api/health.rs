//! Health check endpoint

use axum::Json;
use axum::extract::State;
use http::StatusCode;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, store) = match state.store().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, "Store ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status,
        Json(serde_json::json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "store": store,
            "service": "shop-server",
            "environment": state.environment,
            "version": env!("CARGO_PKG_VERSION"),
            "git_hash": option_env!("GIT_HASH").unwrap_or("dev"),
        })),
    )
}
