//! Client configuration read once at startup.

use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Variable holding the API base URL.
pub const BASE_URL_ENV: &str = "TASKDECK_API_BASE_URL";
/// Variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "TASKDECK_HTTP_TIMEOUT_SECS";
/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings fixed for the lifetime of an [`ApiClient`](crate::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for `base_url` with the default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base URL is missing or either value is malformed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base URL is missing or either value is malformed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup(BASE_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing {
                variable: BASE_URL_ENV,
            })?;
        let mut config = Self::new(parse_base_url(&raw_url)?);

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.timeout = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for `path` (plus query pairs) under the base URL.
    ///
    /// The path is appended verbatim so base URLs carrying a prefix such as
    /// `/api/v1` keep it.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the combined URL is invalid.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

/// Parse and validate an API base URL.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for unparsable or non-HTTP URLs.
pub fn parse_base_url(input: &str) -> ConfigResult<Url> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|_| ConfigError::Invalid {
        variable: BASE_URL_ENV,
        value: trimmed.to_string(),
        reason: "not a valid URL",
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            variable: BASE_URL_ENV,
            value: trimmed.to_string(),
            reason: "scheme must be http or https",
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid {
            variable: BASE_URL_ENV,
            value: trimmed.to_string(),
            reason: "base URL must not carry a query or fragment",
        });
    }
    Ok(url)
}

fn parse_timeout(input: &str) -> ConfigResult<Duration> {
    let invalid = || ConfigError::Invalid {
        variable: TIMEOUT_ENV,
        value: input.to_string(),
        reason: "expected a positive number of seconds",
    };
    let seconds: u64 = input.trim().parse().map_err(|_| invalid())?;
    if seconds == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(seconds))
}
