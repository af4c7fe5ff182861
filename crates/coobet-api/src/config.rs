//! Client configuration.

use std::time::Duration as StdDuration;

use chrono::Duration;
use url::Url;

use crate::error::{ApiError, Result};

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://apiv2.coobet.app/";

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("coobet-api/", env!("CARGO_PKG_VERSION"));

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin every request path is resolved against (always ends with `/`).
    pub base_url: String,
    /// Login endpoint (exempt from bearer attachment).
    pub login_path: String,
    /// Refresh endpoint (exempt from bearer attachment).
    pub refresh_path: String,
    /// Logout endpoint.
    pub logout_path: String,
    /// Route the navigator is sent to when the session ends.
    pub login_route: String,
    /// Route the navigator is sent to after a successful login.
    pub home_route: String,
    /// Lifetime of the access credential in the cookie mirror (default: 7 days)
    pub access_max_age: Duration,
    /// Lifetime of the refresh credential and profile in the cookie mirror (default: 30 days)
    pub refresh_max_age: Duration,
    /// Whether cookie mirror entries carry the `Secure` attribute.
    pub secure_cookies: bool,
    /// Per-request timeout; `None` keeps the transport default.
    pub request_timeout: Option<StdDuration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: "/auth/login".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            logout_path: "/auth/logout".to_string(),
            login_route: "/login".to_string(),
            home_route: "/dashboard".to_string(),
            access_max_age: Duration::days(7),
            refresh_max_age: Duration::days(30),
            secure_cookies: true,
            request_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create ClientConfig from environment variables.
    ///
    /// Environment variables:
    /// - `COOBET_API_BASE_URL`: API origin (default: `https://apiv2.coobet.app/`)
    /// - `COOBET_SECURE_COOKIES`: `true`/`false` (default: true)
    /// - `COOBET_HTTP_TIMEOUT_SECS`: request timeout in seconds (default: transport default)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (used by [`Self::from_env`]).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("COOBET_API_BASE_URL") {
            config = config.with_base_url(&raw)?;
        }

        if let Some(raw) = lookup("COOBET_SECURE_COOKIES") {
            config.secure_cookies = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ApiError::config(format!(
                        "COOBET_SECURE_COOKIES must be a boolean, got {other:?}"
                    )));
                }
            };
        }

        if let Some(raw) = lookup("COOBET_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::config(format!(
                    "COOBET_HTTP_TIMEOUT_SECS must be a number of seconds, got {raw:?}"
                ))
            })?;
            config.request_timeout = (secs > 0).then(|| StdDuration::from_secs(secs));
        }

        Ok(config)
    }

    /// Replace the API origin. A trailing slash is added so relative joins keep the full path.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self> {
        let mut url = Url::parse(raw.trim())?;
        if url.cannot_be_a_base() {
            return Err(ApiError::config(format!("{raw} cannot be used as a base URL")));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url.into();
        Ok(self)
    }

    /// Whether requests to `path` must go out without a bearer credential.
    pub fn is_auth_exempt(&self, path: &str) -> bool {
        path.contains(&self.login_path) || path.contains(&self.refresh_path)
    }

    /// Resolve a request path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}
