//! Protocol module for chat request/response structures
//!
//! This module defines the uniform data model every provider adapter speaks.
//! These structures are designed to be:
//! - Provider-agnostic
//! - Shared between blocking and streaming calls
//! - Type-safe and serializable

pub mod types;

pub use types::{
    ChatRequest, ChatResponse, CompletionUsage, Message, MessageRole, ModelInfo, TokenDelta,
    ValidationResult,
};

// Re-export common traits for convenience
pub use types::IntoMessage;
