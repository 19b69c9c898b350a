//! Object storage client for the hosted storage API (Supabase-compatible
//! `/storage/v1`).

use crate::config::StorageConfig;
use async_trait::async_trait;
use axum::body::Body;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("signed URL request failed ({status:?}): {message}")]
    Signing {
        status: Option<u16>,
        message: String,
    },

    #[error("object fetch returned {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid object URL: {0}")]
    InvalidUrl(String),
}

/// A successfully fetched object: upstream headers and a streaming body.
pub struct FetchedObject {
    pub headers: HeaderMap,
    pub body: Body,
}

impl std::fmt::Debug for FetchedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedObject")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Ask the provider for a URL granting read access for `ttl`.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<Url, StorageError>;

    /// Permanent URL of an object in a publicly readable bucket. Computed
    /// locally, no request is made.
    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, StorageError>;

    /// Plain GET of an object URL. Non-2xx answers are `StorageError::Status`.
    async fn fetch(&self, url: &Url) -> Result<FetchedObject, StorageError>;

    fn health_check(&self) -> Result<(), StorageError>;
}

pub struct SupabaseStorage {
    base_url: Url,
    service_key: Secret<String>,
    client: Client,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::InvalidUrl(config.url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(Self {
            base_url,
            service_key: config.service_key.clone(),
            client,
        })
    }

    /// `{base}/storage/v1/object/{kind}/{bucket}/{path...}`, each segment
    /// percent-encoded.
    fn object_url(&self, kind: &str, bucket: &str, path: &str) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", kind, bucket])
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    /// Signed paths come back relative to the storage API root.
    fn absolute_signed_url(&self, signed_path: &str) -> Result<Url, StorageError> {
        if let Ok(url) = Url::parse(signed_path) {
            return Ok(url);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = if signed_path.starts_with("/storage/v1/") {
            format!("{}{}", base, signed_path)
        } else {
            format!("{}/storage/v1/{}", base, signed_path.trim_start_matches('/'))
        };
        Url::parse(&joined).map_err(|e| StorageError::InvalidUrl(format!("{}: {}", joined, e)))
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<Url, StorageError> {
        let url = self.object_url("sign", bucket, path)?;
        let key = self.service_key.expose_secret();

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .header("apikey", key)
            .json(&SignRequest {
                expires_in: ttl.as_secs(),
            })
            .with_trace_context()
            .send()
            .await
            .map_err(|e| StorageError::Signing {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Signing {
                status: Some(status.as_u16()),
                message,
            });
        }

        let signed: SignResponse = response.json().await.map_err(|e| StorageError::Signing {
            status: Some(status.as_u16()),
            message: format!("unreadable sign response: {}", e),
        })?;

        self.absolute_signed_url(&signed.signed_url)
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, StorageError> {
        self.object_url("public", bucket, path)
    }

    async fn fetch(&self, url: &Url) -> Result<FetchedObject, StorageError> {
        let response = self
            .client
            .get(url.clone())
            .with_trace_context()
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status(status));
        }

        let headers = response.headers().clone();
        Ok(FetchedObject {
            headers,
            body: Body::from_stream(response.bytes_stream()),
        })
    }

    fn health_check(&self) -> Result<(), StorageError> {
        if self.service_key.expose_secret().trim().is_empty() {
            return Err(StorageError::Signing {
                status: None,
                message: "storage service key not configured".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}
