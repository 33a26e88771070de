//! 类型系统模块：护栏请求与响应的核心数据类型。
//!
//! # Types Module
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Conversation turn with role and text content |
//! | [`MessageRole`] | `system`, `user` or `assistant` |
//! | [`ContentPart`] | Text or image part of a multimodal request |
//! | [`GuardrailResponse`] | Validated verdict with derived predicates |
//! | [`RiskLevel`] | Ordered severity (`none < low < medium < high`) |
//! | [`SuggestAction`] | `pass`, `block` or `substitute` |
//!
//! ## Example
//!
//! ```rust
//! use xiangxinai::types::{ContentPart, Message};
//!
//! let history = vec![
//!     Message::user("I want to learn chemistry"),
//!     Message::assistant("Happy to help."),
//!     Message::user("Which reactions are exothermic?"),
//! ];
//! let parts = vec![ContentPart::text("Is this safe?"), ContentPart::image("cat.png")];
//! assert_eq!(history.len(), 3);
//! assert!(parts[1].is_image());
//! ```

pub mod message;
pub mod response;

pub use message::{ContentPart, Message, MessageRole};
pub use response::{
    GuardrailResponse, GuardrailResult, ModelInfo, ModelList, RiskCategoryResult, RiskLevel,
    SuggestAction,
};
