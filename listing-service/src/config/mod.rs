use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

pub const DEFAULT_BUCKET: &str = "property-images";

/// Signed URLs are issued for one hour.
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
const DEFAULT_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub openai: OpenAiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    /// Base URL up to and including the version segment, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    /// Output cap applied to every variation.
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Project URL of the storage provider; the `/storage/v1` API lives below it.
    pub url: String,
    pub service_key: Secret<String>,
    pub default_bucket: String,
    pub signed_url_ttl_secs: u64,
    pub timeout_secs: u64,
}

impl ListingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ListingConfig {
            common: common_config,
            openai: OpenAiConfig {
                api_key: Secret::new(get_env("OPENAI_API_KEY", None, is_prod)?),
                base_url: get_env(
                    "OPENAI_BASE_URL",
                    Some("https://api.openai.com/v1"),
                    is_prod,
                )?,
                model: get_env("OPENAI_MODEL", Some("gpt-3.5-turbo"), is_prod)?,
                max_tokens: get_parsed("OPENAI_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                timeout_secs: get_parsed("OPENAI_TIMEOUT_SECS", 120)?,
            },
            storage: StorageConfig {
                url: get_env("SUPABASE_URL", None, is_prod)?,
                service_key: Secret::new(get_env("SUPABASE_SERVICE_KEY", None, is_prod)?),
                default_bucket: get_env("STORAGE_DEFAULT_BUCKET", Some(DEFAULT_BUCKET), is_prod)?,
                signed_url_ttl_secs: get_parsed(
                    "STORAGE_SIGNED_URL_TTL_SECS",
                    DEFAULT_SIGNED_URL_TTL_SECS,
                )?,
                timeout_secs: get_parsed("STORAGE_TIMEOUT_SECS", 30)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Numeric knobs keep their default in every environment.
fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_falls_back_to_default() {
        let value = get_env("LISTING_TEST_UNSET_WITH_DEFAULT", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn prod_requires_explicit_value() {
        let err = get_env("LISTING_TEST_UNSET_IN_PROD", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn missing_without_default_is_an_error() {
        assert!(get_env("LISTING_TEST_UNSET_NO_DEFAULT", None, false).is_err());
    }

    #[test]
    fn unset_numeric_uses_default() {
        let ttl: u64 = get_parsed("LISTING_TEST_UNSET_TTL", 3600).unwrap();
        assert_eq!(ttl, 3600);
    }
}
