use super::{
    default_headers, map_reqwest_error, ApiRequest, BlockingTransport, Method, RawResponse,
    CLIENT_REQUEST_ID_HEADER, POOL_IDLE_TIMEOUT, POOL_MAX_IDLE_PER_HOST,
};
use crate::config::ClientConfig;
use crate::{Error, ErrorContext, Result};

/// Blocking transport over a pooled `reqwest::blocking::Client`.
///
/// Must not be created or dropped from inside an async runtime; use
/// [`super::HttpTransport`] there.
pub struct BlockingHttpTransport {
    client: reqwest::blocking::Client,
}

impl BlockingHttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .default_headers(default_headers(&config.api_key)?)
            .timeout(config.timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
            .build()
            .map_err(|e| {
                Error::network_with_context(
                    format!("failed to initialise HTTP client: {}", e),
                    ErrorContext::new().with_source("transport"),
                )
            })?;
        Ok(Self { client })
    }
}

impl BlockingTransport for BlockingHttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut req = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        req = req.header(CLIENT_REQUEST_ID_HEADER, request.client_request_id.as_str());

        let resp = req.send().map_err(|e| map_reqwest_error(e, request))?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().map_err(|e| map_reqwest_error(e, request))?;

        Ok(RawResponse::from_parts(status, &headers, body))
    }
}
