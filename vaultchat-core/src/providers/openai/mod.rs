//! OpenAI chat-completions dialect
//!
//! Wire types, conversion and event-stream decoding shared by every adapter
//! whose backend speaks this dialect.

mod client;
pub mod converter;
mod streaming;
pub mod types;

pub use client::{auth_headers, parse_completion, OpenAICompatClient};
pub use streaming::{OpenAISseDecoder, DONE_SENTINEL};
pub use types::{OpenAIRequest, OpenAIResponse, OpenAIStreamChunk};
