//! Client and flow configuration.
//!
//! Network settings are loaded from environment variables with sensible
//! defaults. Flow timings are fixed in production and only shortened by tests.

use std::time::Duration;

use url::Url;

use crate::error::{FacegateError, Result};

/// Default verification service base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the verification service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without trailing slashes.
    base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given base URL.
    ///
    /// The URL must parse as an absolute http(s) URL with a host. Trailing
    /// slashes are stripped so that endpoint paths can be appended directly.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.as_ref());
        if base_url.is_empty() {
            return Err(FacegateError::Config("API base URL is empty".into()));
        }

        let parsed = Url::parse(&base_url).map_err(|e| {
            FacegateError::Config(format!("Invalid API base URL {base_url}: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FacegateError::Config(format!(
                "API base URL must be http(s): {base_url}"
            )));
        }
        match parsed.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => {
                return Err(FacegateError::Config(format!(
                    "API base URL has no host: {base_url}"
                )))
            }
        }

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Optional: `FACEGATE_API_BASE_URL` (defaults to `http://localhost:8000`),
    /// `FACEGATE_HTTP_TIMEOUT_SECS` (defaults to 30).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("FACEGATE_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout = std::env::var("FACEGATE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self::new(base_url)?.with_timeout(timeout))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `enroll` or `verify`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Fixed delays that pace the session flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimings {
    /// Delay between opening the camera and the automatic login capture.
    pub scan_delay: Duration,
    /// Delay between a confirmed match and the authenticated signal.
    pub unlock_delay: Duration,
    /// Delay before a non-match result returns to the mode choice.
    pub failure_reset_delay: Duration,
    /// How long a transient notice stays visible.
    pub notice_lifetime: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            scan_delay: Duration::from_secs(2),
            unlock_delay: Duration::from_secs(2),
            failure_reset_delay: Duration::from_secs(3),
            notice_lifetime: Duration::from_secs(3),
        }
    }
}
