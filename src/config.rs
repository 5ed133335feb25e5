use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub waqi_api_token: String,
    pub waqi_base_url: String,
    pub waqi_feed_path: String,
    pub waqi_search_path: String,
    pub probe_station: String,
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            waqi_api_token: env::var("WAQI_API_TOKEN")
                .map_err(|_| anyhow::anyhow!("WAQI_API_TOKEN not set"))?,
            waqi_base_url: env::var("WAQI_BASE_URL")
                .unwrap_or_else(|_| "https://api.waqi.info".to_string()),
            waqi_feed_path: env::var("WAQI_FEED_PATH")
                .unwrap_or_else(|_| "/feed".to_string()),
            waqi_search_path: env::var("WAQI_SEARCH_PATH")
                .unwrap_or_else(|_| "/search/".to_string()),
            probe_station: env::var("WAQI_PROBE_STATION")
                .unwrap_or_else(|_| "beijing".to_string()),
            request_timeout_secs: env_u64("WAQI_REQUEST_TIMEOUT_SECS", 10),
            probe_timeout_secs: env_u64("WAQI_PROBE_TIMEOUT_SECS", 5),
            cache_ttl_secs: env_u64("AQI_CACHE_TTL_SECS", 300),
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_u64_fallback() {
        assert_eq!(env_u64("AQI_TEST_UNSET_TIMEOUT", 10), 10);
    }
}
