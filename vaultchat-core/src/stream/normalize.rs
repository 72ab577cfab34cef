//! Drives a byte stream through a frame decoder

use super::framing::{Frame, FrameDecoder};
use super::line_buffer::LineBuffer;
use crate::protocol::TokenDelta;
use crate::providers::error::{ProviderError, ProviderResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, warn};

/// Lazy, single-pass sequence of token deltas
///
/// Polling performs the network I/O. A successful stream ends with exactly
/// one delta whose `done` flag is set; a failed one ends with one `Err`.
/// Dropping the stream releases the underlying connection.
pub type TokenStream = Pin<Box<dyn Stream<Item = ProviderResult<TokenDelta>> + Send>>;

/// Normalize a raw byte stream into token deltas
///
/// Only complete lines are decoded; the remainder of a read is kept for the
/// next one. When the transport closes, the unterminated remainder is decoded
/// as a last line and a terminal delta is emitted if the decoder produced none.
pub fn normalize<S, E, D>(provider: &str, bytes: S, mut decoder: D) -> TokenStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ProviderError> + Send + 'static,
    D: FrameDecoder,
{
    let provider = provider.to_string();

    Box::pin(async_stream::stream! {
        let mut guard = ReleaseGuard::new(provider.clone());
        let mut bytes = Box::pin(bytes);
        let mut lines = LineBuffer::new();
        let mut closed = false;
        let mut chunks = 0usize;

        loop {
            if !closed {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        chunks += 1;
                        lines.extend(&chunk);
                    }
                    Some(Err(e)) => {
                        let err: ProviderError = e.into();
                        warn!("{} stream failed after {} chunks: {}", provider, chunks, err);
                        guard.finish();
                        yield Err(err);
                        return;
                    }
                    None => {
                        closed = true;
                        lines.close();
                    }
                }
            }

            while let Some(line) = lines.next_line() {
                match decoder.decode_line(&line) {
                    Frame::Skip => {}
                    Frame::Delta(text) => {
                        yield Ok(TokenDelta::text(text));
                    }
                    Frame::Done => {
                        debug!("{} stream reached terminal signal after {} chunks", provider, chunks);
                        guard.finish();
                        yield Ok(TokenDelta::done());
                        return;
                    }
                    Frame::Error(err) => {
                        warn!("{} stream carried an error: {}", provider, err);
                        guard.finish();
                        yield Err(err);
                        return;
                    }
                }
            }

            if closed {
                break;
            }
        }

        if decoder.has_terminal_signal() {
            debug!("{} stream closed without a terminal signal", provider);
        }
        guard.finish();
        yield Ok(TokenDelta::done());
    })
}

/// Drain a token stream into the full answer text
///
/// Stops at the terminal delta; the first error is returned.
pub async fn collect_text(mut stream: TokenStream) -> ProviderResult<String> {
    let mut text = String::new();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        if delta.done {
            break;
        }
        text.push_str(&delta.content);
    }
    Ok(text)
}

/// Logs when a stream is dropped before it finished
///
/// The byte stream is owned by the generator and dropped with it, which
/// closes the connection; this guard only records that it happened early.
struct ReleaseGuard {
    provider: String,
    finished: bool,
}

impl ReleaseGuard {
    fn new(provider: String) -> Self {
        Self {
            provider,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                "{} stream dropped before its terminal delta; releasing connection",
                self.provider
            );
        }
    }
}
