//! Reply lines and multiline reply blocks.

use std::fmt;

use super::ReplyCode;

/// A single CRLF-terminated line received from the server, CRLF stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    raw: String,
}

impl ResponseLine {
    /// Wraps a raw line (without its CRLF).
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Returns the line exactly as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the reply code if the line starts with three ASCII digits.
    #[must_use]
    pub fn code(&self) -> Option<ReplyCode> {
        self.raw.as_bytes().get(..3).and_then(ReplyCode::from_digits)
    }

    /// Returns the separator following the code, if the line has one.
    #[must_use]
    pub fn separator(&self) -> Option<char> {
        self.code()?;
        self.raw[3..].chars().next()
    }

    /// Returns true if this line ends a reply block.
    ///
    /// Only `NNN ` (three digits then a space) terminates. Short lines and
    /// lines without a numeric prefix are continuations, whatever follows.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.separator() == Some(' ')
    }

    /// Returns the text after the four-character `NNN-` / `NNN ` prefix.
    #[must_use]
    pub fn text(&self) -> &str {
        if self.code().is_none() {
            return &self.raw;
        }
        // Falls back to everything after the code for bare codes and
        // multi-byte separators.
        self.raw.get(4..).unwrap_or(&self.raw[3..])
    }
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One logical SMTP reply: continuation lines followed by a terminal line.
///
/// A block always holds at least one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBlock {
    lines: Vec<ResponseLine>,
}

impl ResponseBlock {
    /// Creates a block from its lines, or `None` if `lines` is empty.
    #[must_use]
    pub fn new(lines: Vec<ResponseLine>) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Self { lines })
        }
    }

    /// Returns all lines of the block in arrival order.
    #[must_use]
    pub fn lines(&self) -> &[ResponseLine] {
        &self.lines
    }

    /// Returns the first line.
    #[must_use]
    pub fn first(&self) -> &ResponseLine {
        &self.lines[0]
    }

    /// Returns the terminal line.
    #[must_use]
    pub fn last(&self) -> &ResponseLine {
        &self.lines[self.lines.len() - 1]
    }

    /// Returns the reply code of the first line.
    #[must_use]
    pub fn code(&self) -> Option<ReplyCode> {
        self.first().code()
    }

    /// Returns true if the first line's raw text starts with `code`.
    #[must_use]
    pub fn has_status(&self, code: ReplyCode) -> bool {
        self.first().raw().starts_with(&code.to_string())
    }

    /// Returns the text of every line with the code prefix removed.
    #[must_use]
    pub fn message(&self) -> Vec<&str> {
        self.lines.iter().map(ResponseLine::text).collect()
    }
}

impl fmt::Display for ResponseBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line.raw())?;
        }
        Ok(())
    }
}
