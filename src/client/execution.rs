//! 请求执行逻辑：重试、退避与响应分类，同步与异步共用。
//!
//! Request execution: one retry/classify algorithm for both call styles.
//!
//! [`CallState`] owns the per-call state machine
//! (`Attempt(n)` → `Done` | `Backoff` → `Attempt(n+1)` | `Failed`) and
//! [`interpret`] turns a raw attempt into a typed value or a classified
//! error. The blocking and async drivers below differ only in how they send
//! and how they wait.

use crate::client::policy::{Decision, PolicyEngine};
use crate::error_code::ErrorCode;
use crate::transport::{
    method_name, ApiRequest, AsyncTransport, BlockingTransport, RawResponse,
};
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const MAX_ERROR_TEXT: usize = 512;

/// Next step of a logical call after an attempt completed.
#[derive(Debug)]
pub(crate) enum Step<T> {
    Done(T),
    Backoff(Duration),
    Failed(Error),
}

/// Private retry state of one logical call.
pub(crate) struct CallState<'a> {
    engine: &'a PolicyEngine,
    request: &'a ApiRequest,
    attempt: u32,
    started: Instant,
}

impl<'a> CallState<'a> {
    pub fn new(engine: &'a PolicyEngine, request: &'a ApiRequest) -> Self {
        Self {
            engine,
            request,
            attempt: 0,
            started: Instant::now(),
        }
    }

    /// Number of attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn before_attempt(&self) {
        debug!(
            method = method_name(self.request.method),
            endpoint = self.request.path,
            attempt = self.attempt,
            client_request_id = self.request.client_request_id.as_str(),
            "xiangxinai request attempt"
        );
    }

    /// Feed the outcome of the current attempt and get the next step.
    pub fn on_outcome<T>(&mut self, outcome: Result<T>) -> Step<T> {
        let attempt = self.attempt;
        self.attempt += 1;

        let err = match outcome {
            Ok(value) => {
                debug!(
                    endpoint = self.request.path,
                    attempts = self.attempts(),
                    duration_ms = self.started.elapsed().as_millis() as u64,
                    client_request_id = self.request.client_request_id.as_str(),
                    "xiangxinai request succeeded"
                );
                return Step::Done(value);
            }
            Err(e) => e,
        };

        match self.engine.decide(attempt, &err) {
            Decision::Retry { delay } => {
                warn!(
                    endpoint = self.request.path,
                    error_code = err.code().name(),
                    http_status = err.status_code().unwrap_or(0),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    client_request_id = self.request.client_request_id.as_str(),
                    "xiangxinai request failed, retrying: {}",
                    err.message()
                );
                Step::Backoff(delay)
            }
            Decision::Fail => {
                info!(
                    endpoint = self.request.path,
                    error_code = err.code().name(),
                    http_status = err.status_code().unwrap_or(0),
                    attempts = self.attempts(),
                    duration_ms = self.started.elapsed().as_millis() as u64,
                    client_request_id = self.request.client_request_id.as_str(),
                    "xiangxinai request failed"
                );
                Step::Failed(err)
            }
        }
    }
}

/// Classify one raw attempt and decode its body on success.
///
/// Non-2xx statuses map through [`ErrorCode::from_http_status`]. A 2xx body
/// that is not JSON, or does not decode into `T`, is a server error.
pub(crate) fn interpret<T: DeserializeOwned>(raw: RawResponse) -> Result<T> {
    if !(200..300).contains(&raw.status) {
        return Err(status_error(&raw));
    }

    let mut context = ErrorContext::new()
        .with_status_code(raw.status)
        .with_source("response_parser");
    if let Some(id) = &raw.request_id {
        context = context.with_request_id(id.clone());
    }

    let json: serde_json::Value = serde_json::from_slice(&raw.body).map_err(|e| {
        Error::server_with_context(
            format!("response is not valid JSON: {}", e),
            context.clone().with_details(truncate(&raw.body)),
        )
    })?;
    if context.request_id.is_none() {
        if let Some(id) = json.get("id").and_then(|v| v.as_str()) {
            context = context.with_request_id(id);
        }
    }
    serde_json::from_value(json).map_err(|e| {
        Error::server_with_context(format!("response does not match schema: {}", e), context)
    })
}

fn status_error(raw: &RawResponse) -> Error {
    let code = ErrorCode::from_http_status(raw.status);
    let (message, body_id) = error_detail(&raw.body);

    let mut context = ErrorContext::new()
        .with_status_code(raw.status)
        .with_source("transport");
    if let Some(id) = raw.request_id.clone().or(body_id) {
        context = context.with_request_id(id);
    }
    if let Some(ms) = raw.retry_after_ms {
        context = context.with_retry_after_ms(ms);
    }

    let message = match (code, message) {
        (_, Some(m)) => m,
        (ErrorCode::Authentication, None) => "invalid API key".to_string(),
        (ErrorCode::RateLimited, None) => "rate limit exceeded".to_string(),
        (_, None) => format!("request failed with status {}", raw.status),
    };
    Error::with_code(code, message, context)
}

/// Pull a human-readable message and a request id out of a failure body.
fn error_detail(body: &[u8]) -> (Option<String>, Option<String>) {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) else {
        let text = truncate(body);
        return ((!text.is_empty()).then_some(text), None);
    };
    let message = json
        .get("detail")
        .map(|d| match d.as_str() {
            Some(s) => s.to_string(),
            None => d.to_string(),
        })
        .or_else(|| {
            json.pointer("/error/message")
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });
    let id = json.get("id").and_then(|v| v.as_str()).map(str::to_string);
    (message, id)
}

fn truncate(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_TEXT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Run a logical call to completion, blocking the current thread.
pub(crate) fn run_blocking<T, R>(
    transport: &R,
    engine: &PolicyEngine,
    request: &ApiRequest,
) -> Result<T>
where
    T: DeserializeOwned,
    R: BlockingTransport + ?Sized,
{
    let mut state = CallState::new(engine, request);
    loop {
        state.before_attempt();
        let outcome = transport.send(request).and_then(interpret);
        match state.on_outcome(outcome) {
            Step::Done(value) => return Ok(value),
            Step::Backoff(delay) => std::thread::sleep(delay),
            Step::Failed(err) => return Err(err),
        }
    }
}

/// Run a logical call to completion, suspending only on the network and on backoff.
pub(crate) async fn run_async<T, R>(
    transport: &R,
    engine: &PolicyEngine,
    request: &ApiRequest,
) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncTransport + ?Sized,
{
    let mut state = CallState::new(engine, request);
    loop {
        state.before_attempt();
        let outcome = transport.send(request).await.and_then(interpret);
        match state.on_outcome(outcome) {
            Step::Done(value) => return Ok(value),
            Step::Backoff(delay) => tokio::time::sleep(delay).await,
            Step::Failed(err) => return Err(err),
        }
    }
}
