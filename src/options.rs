use std::fmt;
use std::time::Duration;

use crate::{AirtableError, BackoffParameters, Result};

/// Default REST endpoint.
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.airtable.com";

/// Default value sent in `x-api-version`.
pub const DEFAULT_API_VERSION: &str = "0.1.0";

/// Default per-request timeout (five minutes).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client configuration shared by every request of an [`AirtableClient`](crate::AirtableClient).
#[derive(Clone, Eq, PartialEq)]
pub struct ClientOptions {
    /// Scheme and host of the API, without a trailing slash.
    pub endpoint_url: String,
    /// Full API version; its major component selects the `/v<major>/` path segment.
    pub api_version: String,
    /// Personal access token or API key, sent as a bearer token.
    pub api_key: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Return HTTP 429 to the caller instead of retrying.
    pub no_retry_if_rate_limited: bool,
    /// Accept invalid TLS certificates. Ignored on `wasm32`.
    pub allow_unauthorized_ssl: bool,
    /// Send the user agent as `x-airtable-user-agent`, for runtimes that
    /// refuse to override `User-Agent`.
    pub browser_like: bool,
    /// Delay bounds for rate-limit retries.
    pub rate_limit_backoff: BackoffParameters,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_version", &self.api_version)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("no_retry_if_rate_limited", &self.no_retry_if_rate_limited)
            .field("allow_unauthorized_ssl", &self.allow_unauthorized_ssl)
            .field("browser_like", &self.browser_like)
            .field("rate_limit_backoff", &self.rate_limit_backoff)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            api_key: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            no_retry_if_rate_limited: false,
            allow_unauthorized_ssl: false,
            browser_like: cfg!(target_arch = "wasm32"),
            rate_limit_backoff: BackoffParameters::default(),
        }
    }
}

impl ClientOptions {
    /// Default options with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads options from the environment.
    ///
    /// - `AIRTABLE_API_KEY` (required, non-empty)
    /// - `AIRTABLE_ENDPOINT_URL` (optional, defaults to [`DEFAULT_ENDPOINT_URL`])
    ///
    /// **Not available on `wasm32` targets.**
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("AIRTABLE_API_KEY").ok_or_else(|| {
            AirtableError::Config("missing AIRTABLE_API_KEY environment variable".to_owned())
        })?;
        if api_key.trim().is_empty() {
            return Err(AirtableError::Config(
                "AIRTABLE_API_KEY is set but empty".to_owned(),
            ));
        }

        let mut options = Self::new(api_key.trim());
        if let Some(endpoint) = lookup("AIRTABLE_ENDPOINT_URL") {
            if !endpoint.trim().is_empty() {
                options = options.with_endpoint_url(endpoint);
            }
        }
        Ok(options)
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        let endpoint_url = endpoint_url.into();
        self.endpoint_url = endpoint_url.trim().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_no_retry_if_rate_limited(mut self, no_retry: bool) -> Self {
        self.no_retry_if_rate_limited = no_retry;
        self
    }

    pub fn with_allow_unauthorized_ssl(mut self, allow: bool) -> Self {
        self.allow_unauthorized_ssl = allow;
        self
    }

    pub fn with_browser_like(mut self, browser_like: bool) -> Self {
        self.browser_like = browser_like;
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: BackoffParameters) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Major component of [`api_version`](Self::api_version), e.g. `"0"` for `"0.1.0"`.
    pub fn api_version_major(&self) -> &str {
        self.api_version
            .split('.')
            .next()
            .unwrap_or(self.api_version.as_str())
    }
}
