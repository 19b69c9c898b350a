//! Ordered signed-then-public resolution of stored assets.

use crate::dtos::AssetRef;
use crate::services::storage::{FetchedObject, ObjectStore, StorageError};
use metrics::counter;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One way of reaching an object, tried in `RESOLUTION_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    SignedUrl,
    PublicUrl,
}

pub const RESOLUTION_ORDER: [AssetSource; 2] = [AssetSource::SignedUrl, AssetSource::PublicUrl];

impl AssetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSource::SignedUrl => "signed_url",
            AssetSource::PublicUrl => "public_url",
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one strategy that did not produce the object.
#[derive(Debug)]
enum StepFailure {
    /// Try the next strategy.
    FallThrough(StorageError),
    /// Stop resolving; the request fails as unexpected.
    Abort(StorageError),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("object not found by any strategy")]
    NotFound { attempts: Vec<(AssetSource, StorageError)> },

    #[error("{strategy} resolution failed: {error}")]
    Unexpected {
        strategy: AssetSource,
        error: StorageError,
    },
}

#[derive(Debug)]
pub struct ResolvedAsset {
    pub source: AssetSource,
    pub object: FetchedObject,
}

#[derive(Clone)]
pub struct AssetResolver {
    store: Arc<dyn ObjectStore>,
    signed_url_ttl: Duration,
}

impl AssetResolver {
    pub fn new(store: Arc<dyn ObjectStore>, signed_url_ttl: Duration) -> Self {
        Self {
            store,
            signed_url_ttl,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Walk `RESOLUTION_ORDER` and return the first object fetched
    /// successfully. Each strategy is attempted once.
    pub async fn resolve(&self, asset: &AssetRef) -> Result<ResolvedAsset, ResolveError> {
        let mut attempts = Vec::with_capacity(RESOLUTION_ORDER.len());

        for source in RESOLUTION_ORDER {
            match self.attempt(source, asset).await {
                Ok(object) => {
                    counter!("asset_fetch_attempts_total", "source" => source.as_str(), "outcome" => "success")
                        .increment(1);
                    tracing::info!(
                        bucket = %asset.bucket,
                        path = %asset.path,
                        source = %source,
                        "Asset resolved"
                    );
                    return Ok(ResolvedAsset { source, object });
                }
                Err(StepFailure::FallThrough(error)) => {
                    counter!("asset_fetch_attempts_total", "source" => source.as_str(), "outcome" => "miss")
                        .increment(1);
                    tracing::warn!(
                        bucket = %asset.bucket,
                        path = %asset.path,
                        source = %source,
                        error = %error,
                        "Asset strategy failed, trying next"
                    );
                    attempts.push((source, error));
                }
                Err(StepFailure::Abort(error)) => {
                    counter!("asset_fetch_attempts_total", "source" => source.as_str(), "outcome" => "error")
                        .increment(1);
                    return Err(ResolveError::Unexpected {
                        strategy: source,
                        error,
                    });
                }
            }
        }

        Err(ResolveError::NotFound { attempts })
    }

    async fn attempt(
        &self,
        source: AssetSource,
        asset: &AssetRef,
    ) -> Result<FetchedObject, StepFailure> {
        let url = match source {
            AssetSource::SignedUrl => self
                .store
                .create_signed_url(&asset.bucket, &asset.path, self.signed_url_ttl)
                .await
                .map_err(StepFailure::FallThrough)?,
            AssetSource::PublicUrl => self
                .store
                .public_url(&asset.bucket, &asset.path)
                .map_err(StepFailure::FallThrough)?,
        };

        self.store.fetch(&url).await.map_err(|e| match e {
            StorageError::Transport(_) => StepFailure::Abort(e),
            other => StepFailure::FallThrough(other),
        })
    }
}
