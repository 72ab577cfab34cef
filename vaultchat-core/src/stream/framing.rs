//! Per-line framing contract shared by the provider decoders

use crate::providers::error::ProviderError;

/// What one complete line of a stream means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Nothing to emit: blank line, comment, metadata or an unparseable chunk
    Skip,
    /// A text fragment
    Delta(String),
    /// The provider's terminal signal
    Done,
    /// An error envelope delivered inside the stream
    Error(ProviderError),
}

/// Decodes complete lines of one framing family
pub trait FrameDecoder: Send + 'static {
    /// Decode one line with its newline already removed
    fn decode_line(&mut self, line: &str) -> Frame;

    /// Whether the framing carries an explicit terminal signal
    ///
    /// Streams from framings without one (Gemini) end when the connection closes.
    fn has_terminal_signal(&self) -> bool {
        true
    }
}

/// Payload of an SSE `data:` line, if the line is one
///
/// Accepts `data:` with or without the conventional single space and trims
/// surrounding whitespace. Comments, `event:`/`id:` fields and blank lines
/// yield `None`.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_data() {
        assert_eq!(sse_data("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(sse_data("data:[DONE]"), Some("[DONE]"));
        assert_eq!(sse_data(": OPENROUTER PROCESSING"), None);
        assert_eq!(sse_data("event: message"), None);
        assert_eq!(sse_data(""), None);
    }
}
