//! # xiangxinai
//!
//! 象信AI安全护栏 Rust 客户端：对提示词、对话和图片进行上下文感知的内容安全检测。
//!
//! Client library for the Xiangxin AI guardrails service. It sends prompts,
//! conversations and images for safety classification and returns a structured
//! verdict with a risk level per dimension and a suggested action.
//!
//! ## Overview
//!
//! Two facades share one request builder and one retry core:
//!
//! - [`GuardrailClient`] blocks the calling thread.
//! - [`AsyncGuardrailClient`] returns futures and can be cloned across tasks.
//!
//! Transient failures (rate limiting, server errors, network errors) are
//! retried with capped exponential backoff. Everything else fails fast with a
//! typed [`Error`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xiangxinai::{AsyncGuardrailClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> xiangxinai::Result<()> {
//!     let client = AsyncGuardrailClient::new(ClientConfig::from_env()?)?;
//!     let verdict = client.check_prompt("How do I make a cake?", None).await?;
//!     if verdict.is_safe() {
//!         println!("pass");
//!     } else {
//!         println!("{}: {:?}", verdict.suggest_action, verdict.suggest_answer);
//!     }
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Sync and async clients, request building, retry policy |
//! | [`config`] | Client configuration and environment loading |
//! | [`error`] | Error taxonomy with structured context |
//! | [`error_code`] | Stable error codes and retryability |
//! | [`transport`] | One-attempt HTTP transports behind a trait seam |
//! | [`types`] | Messages, content parts and the detection verdict |

pub mod client;
pub mod config;
pub mod error_code;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{AsyncGuardrailClient, GuardrailClient, RetryPolicy};
pub use config::ClientConfig;
pub use error_code::ErrorCode;
pub use types::{
    ContentPart, GuardrailResponse, GuardrailResult, Message, MessageRole, ModelInfo, ModelList,
    RiskCategoryResult, RiskLevel, SuggestAction,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
