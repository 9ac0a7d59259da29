//! Application configuration.

use serde::{Deserialize, Serialize};

/// Top-level TariffScope configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server port.
    pub port: u16,
    /// Base URL of the government notice API (search + detail).
    pub notice_api_base_url: String,
    /// Base URL of the investigation feed.
    pub investigation_feed_base_url: String,
    /// Per-call timeout for outbound fetches, in seconds.
    pub fetch_timeout_secs: u64,
    /// Result cache TTL, in seconds.
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    /// Create configuration from environment variables and defaults.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let notice_api_base_url = std::env::var("NOTICE_API_BASE_URL")
            .unwrap_or_else(|_| "https://www.federalregister.gov/api/v1".to_string());

        let investigation_feed_base_url = std::env::var("INVESTIGATION_FEED_BASE_URL")
            .unwrap_or_else(|_| "https://datawebws.usitc.gov/dataweb".to_string());

        let fetch_timeout_secs = std::env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let cache_ttl_secs = std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4 * 3600);

        Self {
            port,
            notice_api_base_url,
            investigation_feed_base_url,
            fetch_timeout_secs,
            cache_ttl_secs,
        }
    }
}
