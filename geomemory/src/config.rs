//! Service configuration from env vars (and .env).
//!
//! `AMAP_API_KEY`, `SUPABASE_URL` and `SUPABASE_KEY` are required; everything else has a
//! default. Missing required variables are reported together, before any client is built.

use std::time::Duration;

use thiserror::Error;

use crate::blob_store::DEFAULT_BUCKET;
use crate::checkin::DEFAULT_OWNER_ID;
use crate::error::ClientError;
use crate::geocoding::DEFAULT_AMAP_BASE_URL;
use crate::repository::DEFAULT_TABLE;

/// Variables that must be present and non-empty.
pub const REQUIRED_VARS: [&str; 3] = ["AMAP_API_KEY", "SUPABASE_URL", "SUPABASE_KEY"];

/// Default per-call timeout for every external provider.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration loading or client construction failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: String, message: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Everything needed to build the leaf clients and pipelines.
#[derive(Clone)]
pub struct ServiceConfig {
    pub amap_api_key: String,
    /// AMap endpoint. Default: `https://restapi.amap.com`.
    pub amap_base_url: String,
    pub supabase_url: String,
    pub supabase_key: String,
    /// Storage bucket for check-in images. Default: `checkin-images`.
    pub supabase_bucket: String,
    /// Table holding memory records. Default: `memories`.
    pub supabase_table: String,
    /// Timeout applied to each provider call. Default: 10 s.
    pub http_timeout: Duration,
    /// Owner stamped on every record. Default: `default_user`.
    pub owner_id: String,
}

impl ServiceConfig {
    /// Fill config from env vars. Call `dotenv::dotenv()` first to pick up `.env`.
    ///
    /// Optional: `AMAP_BASE_URL`, `SUPABASE_BUCKET`, `SUPABASE_TABLE`, `HTTP_TIMEOUT_SECS`,
    /// `OWNER_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|&name| get(name).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "HTTP_TIMEOUT_SECS".to_string(),
                    message: format!("expected whole seconds, got {:?}", raw),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        var: "HTTP_TIMEOUT_SECS".to_string(),
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            amap_api_key: get("AMAP_API_KEY").unwrap_or_default(),
            amap_base_url: get("AMAP_BASE_URL").unwrap_or_else(|| DEFAULT_AMAP_BASE_URL.to_string()),
            supabase_url: get("SUPABASE_URL").unwrap_or_default(),
            supabase_key: get("SUPABASE_KEY").unwrap_or_default(),
            supabase_bucket: get("SUPABASE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            supabase_table: get("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            http_timeout,
            owner_id: get("OWNER_ID").unwrap_or_else(|| DEFAULT_OWNER_ID.to_string()),
        })
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("amap_api_key", &"<redacted>")
            .field("amap_base_url", &self.amap_base_url)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("supabase_bucket", &self.supabase_bucket)
            .field("supabase_table", &self.supabase_table)
            .field("http_timeout", &self.http_timeout)
            .field("owner_id", &self.owner_id)
            .finish()
    }
}
