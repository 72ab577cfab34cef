//! Conversation history

use crate::protocol::{Message, MessageRole};
use serde::{Deserialize, Serialize};

/// Instructions used when a conversation does not set its own
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant for the user's personal notes. Answer in Markdown.";

/// Ordered chat turns plus the system prompt they run under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    system_prompt: String,
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// User and assistant turns in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Forget every turn; the system prompt stays
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Render as a Markdown note
    pub fn to_markdown(&self, title: &str) -> String {
        let mut out = format!("# {}\n", title.trim());

        for message in &self.messages {
            let speaker = match message.role {
                MessageRole::User => "You",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => continue,
            };
            out.push_str(&format!("\n## {}\n\n{}\n", speaker, message.content.trim()));
        }

        out
    }
}
