use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "listing-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: both upstream clients carry usable credentials.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let provider = state.copywriter.provider().health_check();
    let storage = state.assets.store().health_check();

    match (provider, storage) {
        (Ok(()), Ok(())) => Ok(StatusCode::OK),
        (provider, storage) => {
            tracing::warn!(
                provider = ?provider.err(),
                storage = ?storage.err(),
                "Readiness check failed"
            );
            Err(AppError::ServiceUnavailable)
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
