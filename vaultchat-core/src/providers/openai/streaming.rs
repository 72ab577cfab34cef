//! Server-sent event decoding for the OpenAI dialect

use super::converter::from_openai_stream_chunk;
use super::types::OpenAIStreamChunk;
use crate::http::error_from_envelope;
use crate::stream::{sse_data, Frame, FrameDecoder};
use serde_json::Value;
use tracing::debug;

/// Terminal sentinel of an OpenAI event stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Decodes `data:` lines of an OpenAI-style event stream
///
/// Comment lines (OpenRouter's `: OPENROUTER PROCESSING` keep-alives), blank
/// lines and chunks that do not parse are skipped. An error envelope inside
/// a chunk ends the stream with that error.
#[derive(Debug, Default)]
pub struct OpenAISseDecoder;

impl OpenAISseDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for OpenAISseDecoder {
    fn decode_line(&mut self, line: &str) -> Frame {
        let Some(data) = sse_data(line) else {
            return Frame::Skip;
        };

        if data == DONE_SENTINEL {
            return Frame::Done;
        }
        if data.is_empty() {
            return Frame::Skip;
        }

        let value: Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping unparseable stream chunk: {}", e);
                return Frame::Skip;
            }
        };

        if let Some(err) = error_from_envelope(&value) {
            return Frame::Error(err);
        }

        match serde_json::from_value::<OpenAIStreamChunk>(value) {
            Ok(chunk) => from_openai_stream_chunk(chunk).map_or(Frame::Skip, Frame::Delta),
            Err(e) => {
                debug!("Skipping stream chunk with unexpected shape: {}", e);
                Frame::Skip
            }
        }
    }
}
