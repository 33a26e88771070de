//! Client configuration.
//!
//! A [`ClientConfig`] is moved into the client at construction and never
//! mutated afterwards.

use crate::client::policy::RetryPolicy;
use crate::{Error, ErrorContext, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.xiangxinai.cn/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u32,
    pub(crate) retry: RetryPolicy,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is a valid URL"),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry: RetryPolicy::default(),
        }
    }

    /// Build a config from environment variables.
    ///
    /// - `XIANGXINAI_API_KEY` (required)
    /// - `XIANGXINAI_BASE_URL`
    /// - `XIANGXINAI_TIMEOUT_SECS`
    /// - `XIANGXINAI_MAX_RETRIES`
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("XIANGXINAI_API_KEY")
            .map_err(|_| Error::authentication("XIANGXINAI_API_KEY is not set"))?;
        let mut config = Self::new(api_key);

        if let Ok(url) = env::var("XIANGXINAI_BASE_URL") {
            config = config.with_base_url(&url)?;
        }
        if let Some(secs) = env::var("XIANGXINAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = env::var("XIANGXINAI_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config = config.with_max_retries(n);
        }
        Ok(config)
    }

    /// Point the client at another deployment (e.g. an on-premise install).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let invalid = |details: String| Error::Validation {
            message: format!("invalid base url '{}'", base_url),
            context: ErrorContext::new()
                .with_field_path("config.base_url")
                .with_details(details)
                .with_source("config"),
        };
        let url = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        self.base_url = url;
        Ok(self)
    }

    /// Per-attempt timeout. Each retry gets a fresh budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Absolute URL for an endpoint path such as `/guardrails`.
    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Checks performed once, when a client is built from this config.
    pub(crate) fn validate(&self) -> Result<()> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(Error::authentication("API key must not be empty"));
        }
        if key.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(Error::authentication(
                "API key contains whitespace or control characters",
            ));
        }
        Ok(())
    }
}
