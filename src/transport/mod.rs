//! Single-attempt HTTP transports.
//!
//! A transport performs exactly one network round trip and reports what came
//! back; it never retries and never interprets the body. Retry, backoff and
//! response classification live in [`crate::client`], shared by the blocking
//! and async facades. Implement [`AsyncTransport`] or [`BlockingTransport`] to
//! plug in a different HTTP stack.

mod blocking;
mod http;

pub use blocking::BlockingHttpTransport;
pub use http::HttpTransport;

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

pub(crate) const REQUEST_ID_HEADERS: &[&str] = &["x-request-id", "request-id"];
pub(crate) const CLIENT_REQUEST_ID_HEADER: &str = "x-client-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully built request for one logical call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Endpoint path, kept for logging
    pub path: &'static str,
    pub body: Option<serde_json::Value>,
    /// Correlation id, identical across the attempts of one call
    pub client_request_id: String,
}

/// What one attempt received, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub request_id: Option<String>,
    pub retry_after_ms: Option<u64>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            request_id: None,
            retry_after_ms: None,
            body: body.into(),
        }
    }

    pub(crate) fn from_parts(status: u16, headers: &HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            request_id: header_first(headers, REQUEST_ID_HEADERS),
            retry_after_ms: retry_after_ms(headers),
            body,
        }
    }
}

/// Performs one suspending network attempt.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// Performs one blocking network attempt.
pub trait BlockingTransport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(*name) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Best-effort parsing of `Retry-After`. Only the `<seconds>` form is supported.
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    let raw = header_first(headers, &["retry-after"])?;
    let secs: u64 = raw.parse().ok()?;
    Some(secs.saturating_mul(1000))
}

/// Headers sent on every request.
pub(crate) fn default_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
        .map_err(|_| Error::authentication("API key is not a valid header value"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("xiangxinai-rust/", env!("CARGO_PKG_VERSION"))),
    );
    Ok(headers)
}

pub(crate) const POOL_MAX_IDLE_PER_HOST: usize = 32;
pub(crate) const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Map a reqwest failure that happened before a full response was read.
pub(crate) fn map_reqwest_error(e: reqwest::Error, request: &ApiRequest) -> Error {
    let context = ErrorContext::new()
        .with_source("transport")
        .with_details(format!("{} {}", method_name(request.method), request.path));
    if e.is_builder() {
        return Error::Validation {
            message: format!("could not build request: {}", e),
            context: context.with_field_path("config.base_url"),
        };
    }
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("transport failure: {}", e)
    };
    let context = match e.status() {
        Some(s) => context.with_status_code(s.as_u16()),
        None => context,
    };
    Error::network_with_context(message, context)
}

pub(crate) fn method_name(method: Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
    }
}
