//! Configuration for the transport client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{ApiResult, TransportError};

/// Environment variable holding the backend base address.
pub const API_URL_ENV: &str = "PHARMABOT_API_URL";
/// Environment variable holding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "PHARMABOT_TIMEOUT_SECS";

/// Base address used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
/// Result limit used when a search does not ask for one.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Configuration for the backend client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base address, including the `/api` prefix.
    pub base_url: String,
    /// Whole-request timeout, serialized in milliseconds.
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,
    /// Connection timeout, serialized in milliseconds.
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,
    /// Default number of search results.
    pub search_limit: usize,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            search_limit: DEFAULT_SEARCH_LIMIT,
            user_agent: format!("pharmabot-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `PHARMABOT_API_URL` and `PHARMABOT_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs),
                Err(e) => tracing::warn!("Ignoring {TIMEOUT_ENV}={raw}: {e}"),
            }
        }

        config
    }

    /// Set the backend base address.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the default search limit.
    #[must_use]
    pub const fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the base URL is unusable or a value is out of range.
    pub fn validate(&self) -> ApiResult<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::InvalidConfig(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(TransportError::InvalidConfig(
                "request_timeout must be > 0".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(TransportError::InvalidConfig(
                "connect_timeout must be > 0".to_string(),
            ));
        }

        if self.search_limit == 0 {
            return Err(TransportError::InvalidConfig(
                "search_limit must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Durations as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.search_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_base_url("https://pharmabot.example.org/api")
            .with_timeout(Duration::from_secs(5))
            .with_search_limit(20);

        assert_eq!(config.base_url, "https://pharmabot.example.org/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.search_limit, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::new().with_base_url("not a url").validate().is_err());
        assert!(ClientConfig::new().with_base_url("ftp://host/api").validate().is_err());
        assert!(ClientConfig::new().with_timeout(Duration::ZERO).validate().is_err());
        assert!(ClientConfig::new().with_search_limit(0).validate().is_err());
    }

    #[test]
    fn test_durations_serialize_as_millis() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap_or_default();
        assert_eq!(json["request_timeout"], 60_000);
        assert_eq!(json["connect_timeout"], 10_000);
    }

    #[test]
    fn test_sub_second_timeout_round_trips() {
        let config = ClientConfig::new().with_timeout(Duration::from_millis(200));
        let restored = serde_json::to_string(&config)
            .ok()
            .and_then(|raw| serde_json::from_str::<ClientConfig>(&raw).ok());

        assert_eq!(restored.as_ref(), Some(&config));
        assert!(restored.is_some_and(|c| c.validate().is_ok()));
    }
}
