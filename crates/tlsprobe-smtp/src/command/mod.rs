//! SMTP commands sent by the probe.

use std::fmt;

/// Client identity used in EHLO when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "localhost";

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Creates an EHLO command for the given client identity.
    #[must_use]
    pub fn ehlo(hostname: impl Into<String>) -> Self {
        Self::Ehlo {
            hostname: hostname.into(),
        }
    }

    /// Serializes the command to a CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.to_string().into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}
