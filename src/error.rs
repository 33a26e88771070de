use crate::error_code::ErrorCode;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// HTTP status of the failed attempt, if a response was received
    pub status_code: Option<u16>,
    /// Request id supplied by the service, even on failure
    pub request_id: Option<String>,
    /// Offending input field (e.g., "messages[2].content", "images[0]")
    pub field_path: Option<String>,
    /// Additional context about the error
    pub details: Option<String>,
    /// Component that raised the error (e.g., "request_builder", "transport")
    pub source: Option<String>,
    /// Server-requested delay before retrying (429 `Retry-After`)
    pub retry_after_ms: Option<u64>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_retry_after_ms(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }
}

/// Unified error type for the guardrail client.
///
/// The set of variants is closed: every failure maps to exactly one of them.
/// Use [`Error::code`] to branch on the kind without matching on fields.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {message}{}", format_context(.context))]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Rate limit error: {message}{}", format_context(.context))]
    RateLimit {
        message: String,
        context: ErrorContext,
    },

    #[error("Server error: {message}{}", format_context(.context))]
    Server {
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}{}", format_context(.context))]
    Network {
        message: String,
        context: ErrorContext,
    },

    #[error("Client closed: {message}")]
    ClientClosed { message: String },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(status) = ctx.status_code {
        parts.push(format!("status: {}", status));
    }
    if let Some(ref id) = ctx.request_id {
        parts.push(format!("request_id: {}", id));
    }
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Build the variant matching `code`.
    pub fn with_code(code: ErrorCode, msg: impl Into<String>, context: ErrorContext) -> Self {
        let message = msg.into();
        match code {
            ErrorCode::Authentication => Error::Authentication { message, context },
            ErrorCode::Validation => Error::Validation { message, context },
            ErrorCode::RateLimited => Error::RateLimit { message, context },
            ErrorCode::Server => Error::Server { message, context },
            ErrorCode::Network => Error::Network { message, context },
            ErrorCode::ClientClosed => Error::ClientClosed { message },
        }
    }

    pub fn validation(msg: impl Into<String>, field_path: impl Into<String>) -> Self {
        Error::Validation {
            message: msg.into(),
            context: ErrorContext::new()
                .with_field_path(field_path)
                .with_source("request_builder"),
        }
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Error::Authentication {
            message: msg.into(),
            context: ErrorContext::new().with_source("config"),
        }
    }

    pub fn server_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Server {
            message: msg.into(),
            context,
        }
    }

    pub fn network_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Network {
            message: msg.into(),
            context,
        }
    }

    pub fn client_closed() -> Self {
        Error::ClientClosed {
            message: "the client has been closed".to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Authentication { .. } => ErrorCode::Authentication,
            Error::Validation { .. } => ErrorCode::Validation,
            Error::RateLimit { .. } => ErrorCode::RateLimited,
            Error::Server { .. } => ErrorCode::Server,
            Error::Network { .. } => ErrorCode::Network,
            Error::ClientClosed { .. } => ErrorCode::ClientClosed,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().retryable()
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Authentication { message, .. }
            | Error::Validation { message, .. }
            | Error::RateLimit { message, .. }
            | Error::Server { message, .. }
            | Error::Network { message, .. }
            | Error::ClientClosed { message } => message,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Authentication { context, .. }
            | Error::Validation { context, .. }
            | Error::RateLimit { context, .. }
            | Error::Server { context, .. }
            | Error::Network { context, .. } => Some(context),
            Error::ClientClosed { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.context().and_then(|c| c.status_code)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.context().and_then(|c| c.request_id.as_deref())
    }

    pub fn field_path(&self) -> Option<&str> {
        self.context().and_then(|c| c.field_path.as_deref())
    }

    pub(crate) fn retry_after_ms(&self) -> Option<u64> {
        self.context().and_then(|c| c.retry_after_ms)
    }
}
