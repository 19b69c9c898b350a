use crate::dtos::AssetQuery;
use crate::services::{FetchedObject, ResolveError};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

/// Fixed cross-origin headers carried by every response of the asset route.
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
    header::PROXY_AUTHENTICATE,
];

/// `GET /api/storage?path=&bucket=`: stream a stored object back to the
/// browser, signed URL first, public URL second.
pub async fn fetch_asset(
    State(state): State<AppState>,
    Query(query): Query<AssetQuery>,
) -> Result<Response, AppError> {
    let asset = query
        .into_asset_ref(&state.config.storage.default_bucket)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing path parameter")))?;

    match state.assets.resolve(&asset).await {
        Ok(resolved) => Ok(asset_response(resolved.object)),
        Err(ResolveError::NotFound { attempts }) => {
            tracing::warn!(
                bucket = %asset.bucket,
                path = %asset.path,
                attempts = attempts.len(),
                "Asset not found by any strategy"
            );
            Err(AppError::NotFound(anyhow::anyhow!("File not found")))
        }
        Err(e @ ResolveError::Unexpected { .. }) => Err(AppError::InternalError(
            anyhow::Error::new(e).context(format!("fetching {}/{}", asset.bucket, asset.path)),
        )),
    }
}

/// `OPTIONS /api/storage`: CORS preflight. Headers come from the route layer.
pub async fn asset_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn asset_response(object: FetchedObject) -> Response {
    let mut headers = HeaderMap::with_capacity(object.headers.len());
    for (name, value) in object.headers.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    (StatusCode::OK, headers, object.body).into_response()
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name) || name.as_str() == "keep-alive" || name.as_str() == "proxy-connection"
}
