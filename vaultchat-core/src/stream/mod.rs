//! Streaming response normalization
//!
//! Providers stream answers in three framings: OpenAI-style SSE ended by a
//! `data: [DONE]` sentinel, Gemini SSE ended by connection close, and Ollama
//! newline-delimited JSON ended by a `done: true` object. This module holds
//! the pieces they share:
//! - [`LineBuffer`] reassembles lines split across network reads
//! - [`FrameDecoder`] turns one complete line into a [`Frame`]
//! - [`normalize`] drives a byte stream through a decoder, yielding
//!   [`TokenDelta`](crate::protocol::TokenDelta)s lazily
//! - [`ThinkingFilter`] suppresses `<think>` blocks across delta boundaries

mod framing;
mod line_buffer;
mod normalize;
mod thinking;

pub use framing::{sse_data, Frame, FrameDecoder};
pub use line_buffer::LineBuffer;
pub use normalize::{collect_text, normalize, TokenStream};
pub use thinking::{strip_thinking, suppress_thinking, ThinkingFilter, ThinkingState};
