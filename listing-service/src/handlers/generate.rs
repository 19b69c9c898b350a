use crate::dtos::{GenerationRequest, GenerationResponse};
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, Extension, Json};
use service_core::error::AppError;
use service_core::middleware::RequestId;

/// `POST /api/generate`: three copy variations for one listing.
///
/// The body is decoded as JSON whatever its `Content-Type`; browsers posting a
/// plain string send `text/plain`.
pub async fn generate_copy(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> Result<Json<GenerationResponse>, AppError> {
    let request_id = request_id.map(|Extension(id)| id.0).unwrap_or_default();

    let request: GenerationRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(
            request_id = %request_id,
            error = %e,
            "Rejected copy generation payload"
        );
        AppError::BadRequest(anyhow::anyhow!("Invalid request body"))
    })?;

    tracing::info!(
        request_id = %request_id,
        platform = request.platform.as_deref().unwrap_or("-"),
        model = state.copywriter.provider().model(),
        "Generating listing copy"
    );

    let variations = state
        .copywriter
        .generate_variations(&request)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Copy generation failed");
            AppError::InternalError(anyhow::anyhow!("copy generation failed: {}", e))
        })?;

    tracing::info!(
        request_id = %request_id,
        count = variations.len(),
        "Listing copy generated"
    );

    Ok(Json(GenerationResponse { variations }))
}
