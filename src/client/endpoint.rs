use crate::transport::Method;

/// A service endpoint relative to the configured base url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

pub(crate) const DETECTION: Endpoint = Endpoint {
    method: Method::Post,
    path: "/guardrails",
};

pub(crate) const HEALTH: Endpoint = Endpoint {
    method: Method::Get,
    path: "/guardrails/health",
};

pub(crate) const MODELS: Endpoint = Endpoint {
    method: Method::Get,
    path: "/guardrails/models",
};
