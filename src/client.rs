//! Guardrail clients.
//!
//! [`AsyncGuardrailClient`] and [`GuardrailClient`] expose the same operations.
//! Both build requests with [`request::DetectionRequest`] and run them through
//! one retry state machine; only the wait and the transport differ.

pub mod blocking;
pub mod core;
pub(crate) mod endpoint;
mod execution;
pub mod policy;
pub mod request;

pub use blocking::GuardrailClient;
pub use core::AsyncGuardrailClient;
pub use policy::RetryPolicy;
pub use request::{DetectionRequest, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL};
