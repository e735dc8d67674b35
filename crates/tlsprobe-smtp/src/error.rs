//! Error types for SMTP probe sessions.

use std::fmt;
use std::io;
use std::time::Duration;

/// Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a probe session.
///
/// None of these are retried; every variant is terminal for the session
/// that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The peer closed the connection before a complete reply arrived.
    #[error("connection closed before a complete reply was received")]
    ConnectionClosed,

    /// Read, write or connect failure on the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// TLS negotiation failed (certificate, protocol or peer rejection).
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(#[source] io::Error),

    /// The target hostname cannot be used for certificate verification.
    #[error("invalid hostname for TLS: {0}")]
    InvalidHostname(String),

    /// STARTTLS was answered with something other than 220.
    #[error("server rejected STARTTLS: {reply}")]
    ProtocolRejection {
        /// First line of the server's reply.
        reply: String,
    },

    /// A connect, read, write or handshake step exceeded its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A reply line grew past the configured limit without a CRLF.
    #[error("reply line exceeds {0} bytes")]
    LineTooLong(usize),

    /// A reply accumulated more continuation lines than the configured limit.
    #[error("reply block exceeds {0} lines")]
    BlockTooLong(usize),
}

impl Error {
    /// Returns true if the failure happened after the server was reached,
    /// during TLS negotiation.
    #[must_use]
    pub const fn is_tls_failure(&self) -> bool {
        matches!(self, Self::TlsHandshake(_) | Self::InvalidHostname(_))
    }

    /// Returns true if the server cleanly refused the STARTTLS upgrade.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::ProtocolRejection { .. })
    }
}

/// Step of the session in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Opening the TCP connection.
    Connect,
    /// Reading the 220 greeting.
    Greeting,
    /// First EHLO exchange.
    Ehlo,
    /// STARTTLS command and reply.
    StartTls,
    /// TLS handshake.
    Handshake,
    /// EHLO re-sent over the secured channel after STARTTLS.
    SecureEhlo,
    /// QUIT exchange.
    Quit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Handshake => "TLS handshake",
            Self::SecureEhlo => "post-TLS EHLO",
            Self::Quit => "QUIT",
        };
        f.write_str(name)
    }
}

/// A session failure tagged with the phase it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{phase} failed: {source}")]
pub struct SessionError {
    /// Phase that failed.
    pub phase: Phase,
    /// Underlying error.
    pub source: Error,
}

impl SessionError {
    /// Creates a session error for the given phase.
    #[must_use]
    pub const fn new(phase: Phase, source: Error) -> Self {
        Self { phase, source }
    }

    /// Returns a closure that tags an error with `phase`, for use with `map_err`.
    pub fn at(phase: Phase) -> impl FnOnce(Error) -> Self {
        move |source| Self::new(phase, source)
    }
}
