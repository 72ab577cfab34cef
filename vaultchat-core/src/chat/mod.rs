//! Chat over the user's notes
//!
//! A [`ChatSession`] resolves a provider from the registry, grounds the
//! question in notes from the host's [`DocumentStore`] and keeps the
//! [`Conversation`] up to date.

pub mod conversation;
pub mod grounding;
pub mod session;
pub mod store;

pub use conversation::{Conversation, DEFAULT_SYSTEM_PROMPT};
pub use grounding::{excerpt, Grounder, Grounding};
pub use session::{ChatError, ChatSession};
pub use store::{DocumentStore, SearchHit, StoreError};
