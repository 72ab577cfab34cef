//! Suppression of inline reasoning blocks
//!
//! Reasoning models may wrap their internal musing in `<think>` ...
//! `</think>`. When the user does not want to see it, the block is removed:
//! with a regex for complete messages, and with [`ThinkingFilter`] for
//! streams, where either delimiter may be split across deltas.

use super::normalize::TokenStream;
use crate::protocol::TokenDelta;
use futures::StreamExt;
use regex::Regex;
use std::sync::LazyLock;

/// Opening delimiter of a reasoning block
pub const THINK_OPEN: &str = "<think>";

/// Closing delimiter of a reasoning block
pub const THINK_CLOSE: &str = "</think>";

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block pattern"));

static UNCLOSED_THINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*\z").expect("valid unclosed-think pattern"));

/// Remove every reasoning block from a complete message
///
/// An unterminated trailing block is dropped too, matching what the
/// streaming filter emits for the same text.
pub fn strip_thinking(text: &str) -> String {
    let stripped = THINK_BLOCK.replace_all(text, "");
    let stripped = UNCLOSED_THINK.replace(&stripped, "");
    stripped.trim().to_string()
}

/// Where the filter is relative to a reasoning block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingState {
    Outside,
    InsideBlock,
}

/// Incremental reasoning-block filter
///
/// Holds back a trailing fragment that could be the start of a delimiter
/// until the next delta decides it. Leading whitespace is dropped until the
/// first visible character, so the output matches [`strip_thinking`].
#[derive(Debug)]
pub struct ThinkingFilter {
    state: ThinkingState,
    pending: String,
    emitted_any: bool,
}

impl Default for ThinkingFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThinkingFilter {
    pub fn new() -> Self {
        Self {
            state: ThinkingState::Outside,
            pending: String::new(),
            emitted_any: false,
        }
    }

    pub fn state(&self) -> ThinkingState {
        self.state
    }

    /// Feed one delta and return the text that is visible so far
    pub fn push(&mut self, delta: &str) -> String {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(delta);

        let mut visible = String::new();
        let mut rest = text.as_str();

        loop {
            match self.state {
                ThinkingState::Outside => {
                    if let Some(start) = rest.find(THINK_OPEN) {
                        self.emit(&mut visible, &rest[..start]);
                        rest = &rest[start + THINK_OPEN.len()..];
                        self.state = ThinkingState::InsideBlock;
                    } else {
                        let keep = partial_delimiter_len(rest, THINK_OPEN);
                        let split = rest.len() - keep;
                        self.emit(&mut visible, &rest[..split]);
                        self.pending = rest[split..].to_string();
                        break;
                    }
                }
                ThinkingState::InsideBlock => {
                    if let Some(end) = rest.find(THINK_CLOSE) {
                        rest = &rest[end + THINK_CLOSE.len()..];
                        self.state = ThinkingState::Outside;
                    } else {
                        let keep = partial_delimiter_len(rest, THINK_CLOSE);
                        self.pending = rest[rest.len() - keep..].to_string();
                        break;
                    }
                }
            }
        }

        visible
    }

    /// Flush at end of stream
    ///
    /// A held-back fragment outside a block was literal text after all; an
    /// unterminated block is discarded.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        match self.state {
            ThinkingState::Outside => {
                let mut visible = String::new();
                self.emit(&mut visible, &pending);
                visible
            }
            ThinkingState::InsideBlock => String::new(),
        }
    }

    fn emit(&mut self, out: &mut String, segment: &str) {
        let segment = if self.emitted_any {
            segment
        } else {
            segment.trim_start()
        };
        if !segment.is_empty() {
            self.emitted_any = true;
            out.push_str(segment);
        }
    }
}

/// Length of the longest proper prefix of `delimiter` that ends `text`
fn partial_delimiter_len(text: &str, delimiter: &str) -> usize {
    (1..delimiter.len())
        .rev()
        .find(|&len| text.ends_with(&delimiter[..len]))
        .unwrap_or(0)
}

/// Wrap a token stream so reasoning blocks never reach the caller
pub fn suppress_thinking(inner: TokenStream) -> TokenStream {
    Box::pin(async_stream::stream! {
        let mut inner = inner;
        let mut filter = ThinkingFilter::new();

        while let Some(item) = inner.next().await {
            match item {
                Ok(delta) if delta.done => {
                    let tail = filter.finish();
                    if !tail.is_empty() {
                        yield Ok(TokenDelta::text(tail));
                    }
                    yield Ok(delta);
                    return;
                }
                Ok(delta) => {
                    let visible = filter.push(&delta.content);
                    if !visible.is_empty() {
                        yield Ok(TokenDelta::text(visible));
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    })
}
