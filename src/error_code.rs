//! Standard error codes for the guardrail client.
//!
//! Every failure the client can produce maps onto exactly one [`ErrorCode`].
//! The code decides whether the transport core is allowed to retry.
//!
//! | Prefix | Category    | Description                           |
//! |--------|-------------|---------------------------------------|
//! | E1xxx  | client      | Input or credential problems          |
//! | E2xxx  | rate        | Rate limiting                         |
//! | E3xxx  | server      | Service-side or network failures      |
//! | E4xxx  | operational | Local lifecycle state                 |
//!
//! ```rust
//! use xiangxinai::error_code::ErrorCode;
//!
//! let code = ErrorCode::from_http_status(429);
//! assert_eq!(code.code(), "E2001");
//! assert!(code.retryable());
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E1001: malformed input, rejected locally or by the service
    Validation,
    /// E1002: missing, malformed or rejected API key
    Authentication,
    /// E2001: request rate limit exceeded
    RateLimited,
    /// E3001: service-side failure or unusable success body
    Server,
    /// E3003: no response received (connect, reset, timeout)
    Network,
    /// E4001: the client was closed before the call
    ClientClosed,
}

impl ErrorCode {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "E1001",
            Self::Authentication => "E1002",
            Self::RateLimited => "E2001",
            Self::Server => "E3001",
            Self::Network => "E3003",
            Self::ClientClosed => "E4001",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Server => "server_error",
            Self::Network => "network",
            Self::ClientClosed => "client_closed",
        }
    }

    /// Whether the transport core may issue another attempt after this error.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Server | Self::Network)
    }

    /// Classify a non-success HTTP status.
    ///
    /// 2xx statuses never reach this function in practice; if one does it is
    /// treated as a server fault.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            408 => Self::Network,
            429 => Self::RateLimited,
            400..=499 => Self::Validation,
            _ => Self::Server,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}
