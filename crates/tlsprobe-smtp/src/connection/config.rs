//! Probe configuration types.

use std::time::Duration;

use crate::command::DEFAULT_CLIENT_NAME;

/// How TLS is activated on the submission connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// Start with plaintext, upgrade with STARTTLS (port 587).
    StartTls,
    /// TLS from the start (port 465).
    Implicit,
}

impl Security {
    /// Returns the submission port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::StartTls => 587,
            Self::Implicit => 465,
        }
    }

    /// Selects the security mode implied by a submission port.
    ///
    /// Only 465 and 587 are recognized.
    #[must_use]
    pub const fn from_port(port: u16) -> Option<Self> {
        match port {
            465 => Some(Self::Implicit),
            587 => Some(Self::StartTls),
            _ => None,
        }
    }
}

impl std::fmt::Display for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartTls => f.write_str("STARTTLS"),
            Self::Implicit => f.write_str("implicit TLS"),
        }
    }
}

/// Probe configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname, also used for certificate verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// TLS activation mode.
    pub security: Security,
    /// Identity sent with EHLO.
    pub client_name: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Per read/write timeout.
    pub io_timeout: Duration,
    /// TLS handshake timeout.
    pub tls_timeout: Duration,
}

impl Config {
    /// Creates a configuration for `security` on its default port.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self::builder(host, security).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>, security: Security) -> ConfigBuilder {
        ConfigBuilder::new(host, security)
    }
}

/// Builder for probe configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    client_name: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    tls_timeout: Duration,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname and security mode.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self {
            host: host.into(),
            port: None,
            security,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            tls_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the EHLO identity.
    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the TLS handshake timeout.
    #[must_use]
    pub const fn tls_timeout(mut self, timeout: Duration) -> Self {
        self.tls_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            client_name: self.client_name,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            tls_timeout: self.tls_timeout,
        }
    }
}
