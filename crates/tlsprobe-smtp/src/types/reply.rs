//! SMTP reply codes.

/// Three-digit SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Parses the three leading ASCII digits of a reply line.
    #[must_use]
    pub fn from_digits(digits: &[u8]) -> Option<Self> {
        match digits {
            [a, b, c] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
                let value =
                    u16::from(a - b'0') * 100 + u16::from(b - b'0') * 10 + u16::from(c - b'0');
                Some(Self(value))
            }
            _ => None,
        }
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

// Codes a submission probe is likely to see
impl ReplyCode {
    /// 220 Service ready (greeting, and "ready to start TLS")
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 454 TLS not available due to temporary reason
    pub const TLS_NOT_AVAILABLE: Self = Self(454);
    /// 502 Command not implemented
    pub const NOT_IMPLEMENTED: Self = Self(502);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert!(ReplyCode::SERVICE_READY.is_success());
        assert!(ReplyCode::CLOSING.is_success());
        assert!(ReplyCode::new(354).is_intermediate());
        assert!(ReplyCode::TLS_NOT_AVAILABLE.is_transient());
        assert!(ReplyCode::NOT_IMPLEMENTED.is_permanent());
        assert!(!ReplyCode::OK.is_permanent());
    }

    #[test]
    fn from_digits() {
        assert_eq!(ReplyCode::from_digits(b"220"), Some(ReplyCode::SERVICE_READY));
        assert_eq!(ReplyCode::from_digits(b"007").unwrap().as_u16(), 7);
        assert_eq!(ReplyCode::from_digits(b"22"), None);
        assert_eq!(ReplyCode::from_digits(b"2a0"), None);
        assert_eq!(ReplyCode::from_digits(b"2200"), None);
    }

    #[test]
    fn display_is_three_digits() {
        assert_eq!(ReplyCode::OK.to_string(), "250");
        assert_eq!(ReplyCode::new(7).to_string(), "007");
    }

    #[test]
    fn ordering() {
        assert!(ReplyCode::OK < ReplyCode::TLS_NOT_AVAILABLE);
        assert!(ReplyCode::TLS_NOT_AVAILABLE < ReplyCode::NOT_IMPLEMENTED);
    }
}
