//! Reply framing for SMTP.
//!
//! Turns a chunked byte stream into complete reply blocks. Network reads
//! are not assumed to line up with line or block boundaries: bytes that
//! arrive after a block's terminal line are kept for the next block.
//!
//! A block ends at the first line of the form `NNN <text>` (three ASCII
//! digits then a space). Every other line, including malformed ones, is a
//! continuation. A server that never sends a terminal line therefore keeps
//! the framer waiting until the peer closes, which surfaces as
//! [`Error::ConnectionClosed`].

use std::mem;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::types::{ResponseBlock, ResponseLine};

/// Bytes reserved before each read.
const READ_CHUNK: usize = 4096;

/// Default maximum line length to prevent memory exhaustion.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Default maximum number of lines in one reply block.
pub const DEFAULT_MAX_BLOCK_LINES: usize = 1024;

/// Incremental SMTP reply framer.
#[derive(Debug)]
pub struct ResponseFramer {
    residual: BytesMut,
    /// Offset into `residual` already searched for CRLF.
    scanned: usize,
    lines: Vec<ResponseLine>,
    max_line_length: usize,
    max_block_lines: usize,
}

impl Default for ResponseFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFramer {
    /// Creates an empty framer with the default line limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Creates an empty framer that rejects lines longer than `max`.
    #[must_use]
    pub fn with_max_line_length(max: usize) -> Self {
        Self {
            residual: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            lines: Vec::new(),
            max_line_length: max,
            max_block_lines: DEFAULT_MAX_BLOCK_LINES,
        }
    }

    /// Sets the maximum number of lines accepted in one reply block.
    #[must_use]
    pub fn max_block_lines(mut self, max: usize) -> Self {
        self.max_block_lines = max;
        self
    }

    /// Appends received bytes to the residual buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.residual.extend_from_slice(bytes);
    }

    /// Extracts lines from the residual buffer until a block is complete.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Lines already extracted
    /// stay in the pending block across calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineTooLong`] if an unterminated line exceeds the
    /// configured limit, and [`Error::BlockTooLong`] if a block has more
    /// lines than allowed without reaching its terminal line.
    pub fn poll_block(&mut self) -> Result<Option<ResponseBlock>> {
        while let Some(line) = self.take_line()? {
            let terminal = line.is_terminal();
            self.lines.push(line);
            if terminal {
                return Ok(ResponseBlock::new(mem::take(&mut self.lines)));
            }
            if self.lines.len() >= self.max_block_lines {
                return Err(Error::BlockTooLong(self.max_block_lines));
            }
        }
        Ok(None)
    }

    /// Reads from `reader` until a complete reply block is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] on end-of-stream before the
    /// terminal line, [`Error::Transport`] if a read fails, and
    /// [`Error::LineTooLong`] or [`Error::BlockTooLong`] for oversized
    /// replies.
    pub async fn next_block<R>(&mut self, reader: &mut R) -> Result<ResponseBlock>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(block) = self.poll_block()? {
                return Ok(block);
            }

            self.residual.reserve(READ_CHUNK);
            let n = reader.read_buf(&mut self.residual).await?;
            if n == 0 {
                tracing::debug!(
                    pending_lines = self.lines.len(),
                    residual = self.residual.len(),
                    "EOF before terminal reply line"
                );
                return Err(Error::ConnectionClosed);
            }
        }
    }

    /// Returns the number of buffered bytes not yet assigned to a line.
    #[must_use]
    pub fn residual_len(&self) -> usize {
        self.residual.len()
    }

    /// Returns true if part of a block has been read but not its terminal line.
    #[must_use]
    pub fn has_partial_block(&self) -> bool {
        !self.lines.is_empty()
    }

    fn take_line(&mut self) -> Result<Option<ResponseLine>> {
        // Step back one byte so a CR at the end of the last scan still pairs
        // with an LF that arrived later.
        let start = self.scanned.saturating_sub(1);
        match find_crlf(&self.residual[start..]) {
            Some(pos) => {
                let end = start + pos;
                let raw = self.residual.split_to(end);
                self.residual.advance(2);
                self.scanned = 0;
                Ok(Some(ResponseLine::new(String::from_utf8_lossy(&raw))))
            }
            None => {
                self.scanned = self.residual.len();
                if self.residual.len() > self.max_line_length {
                    return Err(Error::LineTooLong(self.max_line_length));
                }
                Ok(None)
            }
        }
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw_lines(block: &ResponseBlock) -> Vec<&str> {
        block.lines().iter().map(ResponseLine::raw).collect()
    }

    #[test]
    fn test_single_line_reply() {
        let mut framer = ResponseFramer::new();
        framer.feed(b"220 mx.example.com ESMTP\r\n");
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(raw_lines(&block), vec!["220 mx.example.com ESMTP"]);
        assert_eq!(framer.residual_len(), 0);
    }

    #[test]
    fn test_multiline_split_across_feeds() {
        let mut framer = ResponseFramer::new();
        framer.feed(b"250-PIPELINING\r\n250-SI");
        assert!(framer.poll_block().unwrap().is_none());
        assert!(framer.has_partial_block());
        framer.feed(b"ZE 10240000\r\n250 HE");
        assert!(framer.poll_block().unwrap().is_none());
        framer.feed(b"LP\r\n");
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(
            raw_lines(&block),
            vec!["250-PIPELINING", "250-SIZE 10240000", "250 HELP"]
        );
        assert!(!framer.has_partial_block());
    }

    #[test]
    fn test_crlf_split_between_feeds() {
        let mut framer = ResponseFramer::new();
        framer.feed(b"250 OK\r");
        assert!(framer.poll_block().unwrap().is_none());
        framer.feed(b"\n");
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(raw_lines(&block), vec!["250 OK"]);
    }

    #[test]
    fn test_trailing_bytes_kept_for_next_block() {
        let mut framer = ResponseFramer::new();
        framer.feed(b"250 first\r\n221 bye\r\n");
        let first = framer.poll_block().unwrap().unwrap();
        assert_eq!(raw_lines(&first), vec!["250 first"]);
        assert_eq!(framer.residual_len(), b"221 bye\r\n".len());
        let second = framer.poll_block().unwrap().unwrap();
        assert_eq!(raw_lines(&second), vec!["221 bye"]);
    }

    #[test]
    fn test_malformed_lines_are_continuations() {
        let mut framer = ResponseFramer::new();
        framer.feed(b"250\r\nhello world\r\nab1 nope\r\n25 x\r\n");
        assert!(framer.poll_block().unwrap().is_none());
        framer.feed(b"250 done\r\n");
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(block.lines().len(), 5);
        assert_eq!(block.last().raw(), "250 done");
    }

    #[test]
    fn test_bare_lf_does_not_end_line() {
        let mut framer = ResponseFramer::new();
        framer.feed(b"250-a\n250 b\r\n");
        assert!(framer.poll_block().unwrap().is_none());
        framer.feed(b"250 c\r\n");
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(raw_lines(&block), vec!["250-a\n250 b", "250 c"]);
    }

    #[test]
    fn test_multibyte_split_across_feeds() {
        let text = "250 Grüße\r\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut framer = ResponseFramer::new();
        framer.feed(&text[..split]);
        assert!(framer.poll_block().unwrap().is_none());
        framer.feed(&text[split..]);
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(block.first().raw(), "250 Grüße");
    }

    #[test]
    fn test_line_too_long() {
        let mut framer = ResponseFramer::with_max_line_length(8);
        framer.feed(b"250-0123456789");
        assert!(matches!(framer.poll_block(), Err(Error::LineTooLong(8))));
    }

    #[test]
    fn test_block_line_limit() {
        let mut framer = ResponseFramer::new().max_block_lines(3);
        framer.feed(b"250-a\r\n250-b\r\n");
        assert!(framer.poll_block().unwrap().is_none());
        framer.feed(b"250-c\r\n250-d\r\n");
        assert!(matches!(framer.poll_block(), Err(Error::BlockTooLong(3))));
    }

    #[test]
    fn test_terminal_line_at_block_limit_is_accepted() {
        let mut framer = ResponseFramer::new().max_block_lines(3);
        framer.feed(b"250-a\r\n250-b\r\n250 c\r\n");
        let block = framer.poll_block().unwrap().unwrap();
        assert_eq!(raw_lines(&block), vec!["250-a", "250-b", "250 c"]);
    }

    #[tokio::test]
    async fn test_continuation_flood_is_rejected() {
        let flood = b"250-x\r\n".repeat(DEFAULT_MAX_BLOCK_LINES);
        let mut reader = tokio_test::io::Builder::new().read(&flood).build();
        let mut framer = ResponseFramer::new();
        let err = framer.next_block(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::BlockTooLong(DEFAULT_MAX_BLOCK_LINES)));
    }

    #[tokio::test]
    async fn test_next_block_reads_chunks() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"250-PIPE")
            .read(b"LINING\r\n250-SIZE 10240000\r")
            .read(b"\n250 HELP\r\n")
            .build();
        let mut framer = ResponseFramer::new();
        let block = framer.next_block(&mut reader).await.unwrap();
        assert_eq!(
            raw_lines(&block),
            vec!["250-PIPELINING", "250-SIZE 10240000", "250 HELP"]
        );
    }

    #[tokio::test]
    async fn test_next_block_eof_before_terminal_line() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"250-PIPELINING\r\n250-SIZE")
            .build();
        let mut framer = ResponseFramer::new();
        let err = framer.next_block(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_next_block_eof_after_malformed_final_line() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"250-ok\r\nbogus final line\r\n")
            .build();
        let mut framer = ResponseFramer::new();
        let err = framer.next_block(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_next_block_read_error_is_transport() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"250-ok\r\n")
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset by peer",
            ))
            .build();
        let mut framer = ResponseFramer::new();
        let err = framer.next_block(&mut reader).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(ref e) if e.kind() == std::io::ErrorKind::ConnectionReset
        ));
    }
}
