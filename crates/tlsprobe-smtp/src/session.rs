//! Probe session driver.
//!
//! One state machine covers both TLS activation modes:
//!
//! ```text
//! STARTTLS:  Connected ─ greeting ─ EHLO ─ STARTTLS(220?) ─┐
//!                                                          ├─ handshake ─ Secured
//! Implicit:  Connected ────────────────────────────────────┘
//!
//! Secured:   [greeting, implicit only] ─ EHLO ─ QUIT ─ Closed
//! ```
//!
//! The channel is closed on every exit path. A failed handshake drops the
//! plaintext stream inside the upgrade; every other failure closes the
//! channel explicitly before the error is returned.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::command::Command;
use crate::connection::{
    Config, Plaintext, RustlsUpgrader, Secured, Security, SmtpChannel, TlsInfo, TlsUpgrader,
    connect,
};
use crate::error::{Error, Phase, Result, SessionError};
use crate::transcript::TranscriptSink;
use crate::types::{Capabilities, ReplyCode, ResponseBlock};

/// Summary of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// TLS activation mode that was exercised.
    pub security: Security,
    /// Server greeting.
    pub greeting: ResponseBlock,
    /// Negotiated TLS parameters, when the upgrader reports them.
    pub tls: Option<TlsInfo>,
    /// Whether the plaintext EHLO advertised STARTTLS (STARTTLS mode only).
    pub starttls_advertised: Option<bool>,
    /// Extensions advertised by the EHLO sent over TLS.
    pub capabilities: Capabilities,
    /// Reply to QUIT.
    pub quit: ResponseBlock,
}

/// Replies collected over the secured channel.
struct SecuredReplies {
    greeting: ResponseBlock,
    capabilities: Capabilities,
    quit: ResponseBlock,
}

/// A single-shot probe of one submission endpoint.
pub struct Session<U> {
    config: Config,
    upgrader: U,
}

impl Session<RustlsUpgrader> {
    /// Creates a session that verifies the server certificate against
    /// `config.host`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHostname`] if the host cannot be used as a
    /// TLS server name.
    pub fn new(config: Config) -> Result<Self> {
        let upgrader = RustlsUpgrader::new(&config.host)?;
        Ok(Self { config, upgrader })
    }
}

impl<U> Session<U> {
    /// Creates a session with a custom TLS upgrader.
    pub const fn with_upgrader(config: Config, upgrader: U) -> Self {
        Self { config, upgrader }
    }

    /// Connects to the configured endpoint and runs the session.
    ///
    /// # Errors
    ///
    /// Returns the first failure, tagged with the phase it happened in.
    pub async fn connect_and_run<T>(
        &self,
        sink: &mut T,
    ) -> std::result::Result<Report, SessionError>
    where
        U: TlsUpgrader<TcpStream>,
        T: TranscriptSink + ?Sized,
    {
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            security = %self.config.security,
            "connecting"
        );
        let stream = connect(&self.config.host, self.config.port, self.config.connect_timeout)
            .await
            .map_err(SessionError::at(Phase::Connect))?;
        self.run(stream, sink).await
    }

    /// Runs the session over an already connected plaintext stream.
    ///
    /// # Errors
    ///
    /// Returns the first failure, tagged with the phase it happened in.
    pub async fn run<S, T>(
        &self,
        stream: S,
        sink: &mut T,
    ) -> std::result::Result<Report, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        U: TlsUpgrader<S>,
        T: TranscriptSink + ?Sized,
    {
        let ehlo = Command::ehlo(&self.config.client_name);
        let mut plain = SmtpChannel::new(stream, self.config.io_timeout);

        let (greeting, starttls_advertised) = match self.config.security {
            Security::Implicit => (None, None),
            Security::StartTls => match Self::negotiate_starttls(&mut plain, &ehlo, sink).await {
                Ok((greeting, advertised)) => (Some(greeting), Some(advertised)),
                Err(e) => {
                    plain.close().await;
                    return Err(e);
                }
            },
        };

        tracing::debug!("starting TLS handshake");
        let mut secured = plain
            .upgrade(&self.upgrader, self.config.tls_timeout)
            .await
            .map_err(SessionError::at(Phase::Handshake))?;

        let tls = <U as TlsUpgrader<S>>::negotiated(&self.upgrader, secured.stream());
        match &tls {
            Some(info) => tracing::info!(%info, "TLS established"),
            None => tracing::info!("TLS established"),
        }
        sink.secured(tls.as_ref());

        let outcome = Self::secured_exchange(&mut secured, greeting, &ehlo, sink).await;
        secured.close().await;
        let replies = outcome?;

        Ok(Report {
            security: self.config.security,
            greeting: replies.greeting,
            tls,
            starttls_advertised,
            capabilities: replies.capabilities,
            quit: replies.quit,
        })
    }

    /// Greeting, EHLO and STARTTLS over the plaintext channel.
    async fn negotiate_starttls<S, T>(
        plain: &mut SmtpChannel<S, Plaintext>,
        ehlo: &Command,
        sink: &mut T,
    ) -> std::result::Result<(ResponseBlock, bool), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        T: TranscriptSink + ?Sized,
    {
        let greeting = plain
            .receive(sink)
            .await
            .map_err(SessionError::at(Phase::Greeting))?;

        let reply = plain
            .exchange(ehlo, sink)
            .await
            .map_err(SessionError::at(Phase::Ehlo))?;
        let advertised = Capabilities::from_ehlo(&reply).supports_starttls();
        if !advertised {
            tracing::warn!("server did not advertise STARTTLS, trying it anyway");
        }

        let reply = plain
            .exchange(&Command::StartTls, sink)
            .await
            .map_err(SessionError::at(Phase::StartTls))?;
        if !reply.has_status(ReplyCode::SERVICE_READY) {
            let line = reply.first().raw().to_string();
            return Err(SessionError::new(
                Phase::StartTls,
                Error::ProtocolRejection { reply: line },
            ));
        }

        Ok((greeting, advertised))
    }

    /// Remaining exchanges once TLS is up.
    ///
    /// `greeting` is `None` in implicit mode, where the server only greets
    /// after the handshake.
    async fn secured_exchange<C, T>(
        channel: &mut SmtpChannel<C, Secured>,
        greeting: Option<ResponseBlock>,
        ehlo: &Command,
        sink: &mut T,
    ) -> std::result::Result<SecuredReplies, SessionError>
    where
        C: AsyncRead + AsyncWrite + Unpin,
        T: TranscriptSink + ?Sized,
    {
        let (greeting, ehlo_phase) = match greeting {
            Some(greeting) => (greeting, Phase::SecureEhlo),
            None => {
                let greeting = channel
                    .receive(sink)
                    .await
                    .map_err(SessionError::at(Phase::Greeting))?;
                (greeting, Phase::Ehlo)
            }
        };

        let reply = channel
            .exchange(ehlo, sink)
            .await
            .map_err(SessionError::at(ehlo_phase))?;
        let capabilities = Capabilities::from_ehlo(&reply);

        let quit = channel
            .exchange(&Command::Quit, sink)
            .await
            .map_err(SessionError::at(Phase::Quit))?;

        Ok(SecuredReplies {
            greeting,
            capabilities,
            quit,
        })
    }
}
