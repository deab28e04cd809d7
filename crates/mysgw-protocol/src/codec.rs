//! Line framing for the gateway byte stream.
//!
//! A physical transmission can arrive split across several reads, so bytes
//! are accumulated here and complete lines are handed out one at a time.
//! An unterminated tail stays buffered until its newline arrives or the
//! reader decides the transmission is over and calls
//! [`LineCodec::flush_tail`].

use bytes::BytesMut;

/// Longest frame the gateway firmware emits, header included.
pub const MAX_LINE_LENGTH: usize = 256;

/// Unterminated data beyond this is treated as line noise and discarded.
pub const MAX_BUFFERED: usize = MAX_LINE_LENGTH * 4;

/// Accumulates received bytes and splits them into lines.
#[derive(Debug, Default)]
pub struct LineCodec {
    buffer: BytesMut,
}

impl LineCodec {
    /// Create an empty codec.
    pub fn new() -> Self {
        LineCodec { buffer: BytesMut::with_capacity(MAX_LINE_LENGTH * 2) }
    }

    /// Append received data.
    ///
    /// Returns the number of bytes discarded because the buffer exceeded
    /// [`MAX_BUFFERED`] without containing a newline.
    pub fn push(&mut self, data: &[u8]) -> usize {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > MAX_BUFFERED && !self.buffer.contains(&b'\n') {
            let dropped = self.buffer.len();
            self.buffer.clear();
            return dropped;
        }
        0
    }

    /// Take the next complete line, without its terminator.
    ///
    /// Empty lines are skipped. Returns `None` when no newline is buffered.
    pub fn decode_line(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.iter().position(|&b| b == b'\n')?;
            let mut line = self.buffer.split_to(end + 1);
            line.truncate(end);
            if line.last() == Some(&b'\r') {
                line.truncate(end - 1);
            }
            if line.is_empty() {
                continue;
            }
            return Some(String::from_utf8_lossy(&line).into_owned());
        }
    }

    /// Take whatever is left in the buffer as one final line.
    ///
    /// Used once the stream has gone quiet. Call [`LineCodec::decode_line`]
    /// first; a buffered newline is not treated specially here. Returns
    /// `None` if the tail is empty.
    pub fn flush_tail(&mut self) -> Option<String> {
        let mut tail = self.buffer.split();
        if tail.last() == Some(&b'\r') {
            tail.truncate(tail.len() - 1);
        }
        if tail.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(&tail).into_owned())
    }

    /// Drain every complete line currently buffered.
    pub fn drain_lines(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.decode_line()).collect()
    }

    /// Number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Buffer contents as text, for diagnostics.
    pub fn buffer_as_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line() {
        let mut codec = LineCodec::new();
        codec.push(b"1;1;1;0;0;20.5\n2;1;1;0;1;40\n");

        assert_eq!(codec.decode_line(), Some("1;1;1;0;0;20.5".to_string()));
        assert_eq!(codec.decode_line(), Some("2;1;1;0;1;40".to_string()));
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_partial_line_is_retained() {
        let mut codec = LineCodec::new();
        codec.push(b"1;1;1;0;");
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffered_len(), 8);

        codec.push(b"0;20.5\n3;1");
        assert_eq!(codec.decode_line(), Some("1;1;1;0;0;20.5".to_string()));
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.buffer_as_str(), "3;1");
    }

    #[test]
    fn test_crlf_and_empty_lines() {
        let mut codec = LineCodec::new();
        codec.push(b"\n\r\n0;0;3;0;14;ready\r\n\n");
        assert_eq!(codec.drain_lines(), vec!["0;0;3;0;14;ready".to_string()]);
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_overflow_without_newline_is_discarded() {
        let mut codec = LineCodec::new();
        assert_eq!(codec.push(&[b'x'; MAX_BUFFERED]), 0);
        assert_eq!(codec.push(b"y"), MAX_BUFFERED + 1);
        assert_eq!(codec.buffered_len(), 0);

        codec.push(b"1;1;1;0;0;1\n");
        assert_eq!(codec.decode_line(), Some("1;1;1;0;0;1".to_string()));
    }

    #[test]
    fn test_flush_tail() {
        let mut codec = LineCodec::new();
        codec.push(b"1;1;1;0;0;20.5\n5;3;1;0;2;1\r");
        assert_eq!(codec.decode_line(), Some("1;1;1;0;0;20.5".to_string()));
        assert!(codec.decode_line().is_none());
        assert_eq!(codec.flush_tail(), Some("5;3;1;0;2;1".to_string()));
        assert_eq!(codec.buffered_len(), 0);
        assert_eq!(codec.flush_tail(), None);
    }

    #[test]
    fn test_clear() {
        let mut codec = LineCodec::new();
        codec.push(b"abc");
        codec.clear();
        assert_eq!(codec.buffered_len(), 0);
    }
}
