//! Transport setup and the TLS upgrade seam.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};

use crate::error::{Error, Result};

/// Parameters negotiated by a completed TLS handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsInfo {
    /// Protocol version, e.g. `TLSv1_3`.
    pub protocol: Option<String>,
    /// Cipher suite name.
    pub cipher_suite: Option<String>,
}

impl fmt::Display for TlsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = self.protocol.as_deref().unwrap_or("unknown protocol");
        match &self.cipher_suite {
            Some(suite) => write!(f, "{protocol}, {suite}"),
            None => f.write_str(protocol),
        }
    }
}

/// Performs the client side of a TLS handshake over an owned stream.
///
/// The stream is moved into [`upgrade`](TlsUpgrader::upgrade). If the
/// handshake fails the stream is dropped there, so it is closed exactly once
/// and cannot be used again by the caller.
pub trait TlsUpgrader<S> {
    /// Stream type produced by a successful handshake.
    type Stream: AsyncRead + AsyncWrite + Unpin;

    /// Runs the handshake, consuming the plaintext stream.
    fn upgrade(&self, stream: S) -> impl Future<Output = Result<Self::Stream>>;

    /// Describes the negotiated session, if the implementation can.
    fn negotiated(&self, stream: &Self::Stream) -> Option<TlsInfo> {
        let _ = stream;
        None
    }
}

/// TLS upgrader backed by rustls, verifying against web PKI roots.
#[derive(Clone)]
pub struct RustlsUpgrader {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl RustlsUpgrader {
    /// Creates an upgrader that verifies the certificate against `host`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHostname`] if `host` is not a valid DNS name
    /// or IP address.
    pub fn new(host: &str) -> Result<Self> {
        Self::with_config(host, Arc::new(default_client_config()))
    }

    /// Creates an upgrader using a caller-supplied rustls configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHostname`] if `host` is not a valid DNS name
    /// or IP address.
    pub fn with_config(host: &str, config: Arc<ClientConfig>) -> Result<Self> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| Error::InvalidHostname(host.to_string()))?;
        Ok(Self {
            connector: TlsConnector::from(config),
            server_name,
        })
    }
}

impl fmt::Debug for RustlsUpgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustlsUpgrader")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

impl<S> TlsUpgrader<S> for RustlsUpgrader
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    type Stream = TlsStream<S>;

    async fn upgrade(&self, stream: S) -> Result<TlsStream<S>> {
        self.connector
            .connect(self.server_name.clone(), stream)
            .await
            .map_err(Error::TlsHandshake)
    }

    fn negotiated(&self, stream: &TlsStream<S>) -> Option<TlsInfo> {
        let (_, session) = stream.get_ref();
        Some(TlsInfo {
            protocol: session.protocol_version().map(|v| format!("{v:?}")),
            cipher_suite: session
                .negotiated_cipher_suite()
                .map(|suite| format!("{:?}", suite.suite())),
        })
    }
}

/// Opens a TCP connection to the server. Attempted once, no retry.
///
/// # Errors
///
/// Returns [`Error::Transport`] if the connection fails and
/// [`Error::Timeout`] if it does not complete within `limit`.
pub async fn connect(host: &str, port: u16, limit: Duration) -> Result<TcpStream> {
    within(limit, TcpStream::connect((host, port))).await
}

/// Bounds a connection attempt by `limit`.
async fn within<F>(limit: Duration, connecting: F) -> Result<TcpStream>
where
    F: Future<Output = std::io::Result<TcpStream>>,
{
    let stream = timeout(limit, connecting)
        .await
        .map_err(|_| Error::Timeout(limit))??;
    Ok(stream)
}

/// Creates a client configuration with web PKI root certificates.
fn default_client_config() -> ClientConfig {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}
