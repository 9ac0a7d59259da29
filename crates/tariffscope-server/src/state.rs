//! Shared application state.

use std::time::Duration;

use tariffscope_core::AppConfig;
use tariffscope_fedreg::{DataWebClient, FederalRegisterClient};
use tariffscope_pipeline::{CaseFinder, CaseFinderOutput, TtlCache};

/// The production pipeline wired to live HTTP collaborators.
pub type HttpCaseFinder =
    CaseFinder<DataWebClient, FederalRegisterClient, FederalRegisterClient, FederalRegisterClient>;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub finder: HttpCaseFinder,
    pub cache: TtlCache<CaseFinderOutput>,
}

impl AppState {
    pub fn new(config: AppConfig, cache_ttl: Duration) -> Self {
        let timeout = config.fetch_timeout_secs;
        let feed = DataWebClient::new(config.investigation_feed_base_url.as_str(), timeout);
        // One notice client serves all three roles; clones share the
        // connection pool.
        let notice = FederalRegisterClient::new(config.notice_api_base_url.as_str(), timeout);

        Self {
            config,
            finder: CaseFinder::new(feed, notice.clone(), notice.clone(), notice),
            cache: TtlCache::new(cache_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wires_one_shared_notice_client() {
        let config = AppConfig {
            port: 0,
            notice_api_base_url: "http://localhost/api/v1".to_string(),
            investigation_feed_base_url: "http://localhost/dataweb".to_string(),
            fetch_timeout_secs: 1,
            cache_ttl_secs: 60,
        };
        let state = AppState::new(config, Duration::from_secs(60));
        assert!(state.cache.is_empty());
        assert_eq!(state.config.port, 0);
    }
}
