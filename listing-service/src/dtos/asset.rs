use serde::Deserialize;

/// Query string of `GET /api/storage`.
#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub path: Option<String>,
    pub bucket: Option<String>,
}

/// A stored object, addressed by bucket and path within the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub bucket: String,
    pub path: String,
}

impl AssetQuery {
    /// Resolve the query into an object reference, or `None` when no usable
    /// path was supplied.
    pub fn into_asset_ref(self, default_bucket: &str) -> Option<AssetRef> {
        let path = self
            .path
            .map(|p| p.trim().trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty())?;

        let bucket = self
            .bucket
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| default_bucket.to_string());

        Some(AssetRef { bucket, path })
    }
}
