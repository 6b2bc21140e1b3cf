//! Steam endpoint and credential configuration.
//!
//! Loaded once at startup. A missing API key is a startup error, not a
//! per-request failure: a server that can't resolve profiles shouldn't
//! accept logins at all.

use std::fmt;
use std::time::Duration;

/// Default OpenID 2.0 relay endpoint.
const DEFAULT_OPENID_ENDPOINT: &str = "https://steamcommunity.com/openid/login";

/// Default Steam Web API host.
const DEFAULT_WEB_API_BASE: &str = "https://api.steampowered.com";

/// Default deadline for each outbound call to Steam.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors, surfaced while building the server.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// An environment variable is set but can't be used.
    #[error("invalid value {value:?} for {name}")]
    InvalidVar { name: &'static str, value: String },

    /// The HTTP client could not be constructed (e.g. TLS backend init).
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Where and how to reach Steam.
#[derive(Clone)]
pub struct SteamConfig {
    /// Steam Web API key. Never logged.
    pub api_key: String,
    /// OpenID `check_authentication` endpoint.
    pub openid_endpoint: String,
    /// Base URL of the Web API (`/ISteamUser/...` is appended).
    pub web_api_base: String,
    /// Deadline applied to every outbound request.
    pub request_timeout: Duration,
}

impl SteamConfig {
    pub const API_KEY_VAR: &'static str = "STEAM_WEB_API_KEY";
    pub const OPENID_ENDPOINT_VAR: &'static str = "STEAM_OPENID_ENDPOINT";
    pub const WEB_API_BASE_VAR: &'static str = "STEAM_WEB_API_BASE";
    pub const TIMEOUT_VAR: &'static str = "STEAM_HTTP_TIMEOUT_SECS";

    /// Config with the public Steam endpoints and the default timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            openid_endpoint: DEFAULT_OPENID_ENDPOINT.to_string(),
            web_api_base: DEFAULT_WEB_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// [`ConfigError::MissingVar`] if `STEAM_WEB_API_KEY` is unset or
    /// blank; [`ConfigError::InvalidVar`] if the timeout isn't a positive
    /// whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup` instead of the real environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(Self::API_KEY_VAR)
            .ok_or(ConfigError::MissingVar(Self::API_KEY_VAR))?;
        let mut config = Self::new(api_key.trim());

        if let Some(endpoint) = non_blank(Self::OPENID_ENDPOINT_VAR) {
            config.openid_endpoint = endpoint;
        }
        if let Some(base) = non_blank(Self::WEB_API_BASE_VAR) {
            config.web_api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(raw) = non_blank(Self::TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidVar {
                    name: Self::TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Builds the shared HTTP client with the configured deadline.
    ///
    /// `reqwest::Client` is reference-counted internally; clone it freely.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

impl fmt::Debug for SteamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteamConfig")
            .field("api_key", &"<redacted>")
            .field("openid_endpoint", &self.openid_endpoint)
            .field("web_api_base", &self.web_api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_missing_api_key_is_startup_error() {
        let result = SteamConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingVar("STEAM_WEB_API_KEY"))
        ));
    }

    #[test]
    fn test_from_lookup_blank_api_key_counts_as_missing() {
        let result =
            SteamConfig::from_lookup(lookup_from(&[("STEAM_WEB_API_KEY", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn test_from_lookup_defaults_to_public_endpoints() {
        let config =
            SteamConfig::from_lookup(lookup_from(&[("STEAM_WEB_API_KEY", "k")]))
                .unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.openid_endpoint, DEFAULT_OPENID_ENDPOINT);
        assert_eq!(config.web_api_base, DEFAULT_WEB_API_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_overrides_endpoints_and_timeout() {
        let config = SteamConfig::from_lookup(lookup_from(&[
            ("STEAM_WEB_API_KEY", "k"),
            ("STEAM_OPENID_ENDPOINT", "http://127.0.0.1:9/openid"),
            ("STEAM_WEB_API_BASE", "http://127.0.0.1:9/"),
            ("STEAM_HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.openid_endpoint, "http://127.0.0.1:9/openid");
        assert_eq!(config.web_api_base, "http://127.0.0.1:9");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_lookup_rejects_zero_timeout() {
        let result = SteamConfig::from_lookup(lookup_from(&[
            ("STEAM_WEB_API_KEY", "k"),
            ("STEAM_HTTP_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidVar { name: "STEAM_HTTP_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", SteamConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
