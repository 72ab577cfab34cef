//! Line reassembly across network reads

/// Buffers raw bytes and hands out complete lines
///
/// Lines are split on `\n` at the byte level, so a multi-byte character cut
/// in half by a read boundary is decoded only once both halves arrived.
/// A trailing `\r` is removed from each line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
    closed: bool,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes from one network read
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Mark the input as finished; the unterminated remainder becomes the last line
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Number of buffered bytes not yet returned as a line
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete line, if one is buffered
    pub fn next_line(&mut self) -> Option<String> {
        let line: Vec<u8> = match self.buf.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                line
            }
            None if self.closed && !self.buf.is_empty() => std::mem::take(&mut self.buf),
            None => return None,
        };

        let line = match line.strip_suffix(b"\r") {
            Some(stripped) => stripped,
            None => &line[..],
        };
        Some(String::from_utf8_lossy(line).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partial_line_is_retained() {
        let mut buf = LineBuffer::new();
        buf.extend(b"data: {\"a\":");
        assert_eq!(buf.next_line(), None);
        buf.extend(b"1}\ndata: x");
        assert_eq!(buf.next_line().as_deref(), Some("data: {\"a\":1}"));
        assert_eq!(buf.next_line(), None);
        assert_eq!(buf.pending(), "data: x".len());
    }

    #[test]
    fn test_close_flushes_remainder() {
        let mut buf = LineBuffer::new();
        buf.extend(b"one\ntwo");
        assert_eq!(buf.next_line().as_deref(), Some("one"));
        assert_eq!(buf.next_line(), None);
        buf.close();
        assert_eq!(buf.next_line().as_deref(), Some("two"));
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let mut buf = LineBuffer::new();
        buf.extend(b"a\r\n\r\nb\n");
        assert_eq!(buf.next_line().as_deref(), Some("a"));
        assert_eq!(buf.next_line().as_deref(), Some(""));
        assert_eq!(buf.next_line().as_deref(), Some("b"));
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let text = "héllo\n".as_bytes();
        let mut buf = LineBuffer::new();
        buf.extend(&text[..2]);
        buf.extend(&text[2..]);
        assert_eq!(buf.next_line().as_deref(), Some("héllo"));
    }

    proptest! {
        #[test]
        fn prop_split_point_does_not_change_lines(split in 0usize..40) {
            let input = "data: {\"x\":\"é1\"}\ndata: [DONE]\n".as_bytes();
            let split = split.min(input.len());

            let mut buf = LineBuffer::new();
            buf.extend(&input[..split]);
            let mut lines = Vec::new();
            while let Some(line) = buf.next_line() {
                lines.push(line);
            }
            buf.extend(&input[split..]);
            while let Some(line) = buf.next_line() {
                lines.push(line);
            }

            prop_assert_eq!(lines, vec!["data: {\"x\":\"é1\"}".to_string(), "data: [DONE]".to_string()]);
        }
    }
}
