//! Type-state SMTP channel.

use std::marker::PhantomData;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use super::TlsUpgrader;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::framer::ResponseFramer;
use crate::transcript::TranscriptSink;
use crate::types::ResponseBlock;

/// Type-state marker for a channel that has not been secured.
#[derive(Debug)]
pub struct Plaintext;

/// Type-state marker for a channel running over TLS.
#[derive(Debug)]
pub struct Secured;

/// A stream, its reply framer and its I/O deadline.
///
/// The channel is the only reader and writer of its stream. Upgrading
/// consumes a `Plaintext` channel, so the plaintext handle cannot be used
/// once the handshake has started.
#[derive(Debug)]
pub struct SmtpChannel<S, State> {
    stream: S,
    framer: ResponseFramer,
    io_timeout: Duration,
    _state: PhantomData<State>,
}

impl<S> SmtpChannel<S, Plaintext>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a freshly opened stream.
    pub fn new(stream: S, io_timeout: Duration) -> Self {
        Self {
            stream,
            framer: ResponseFramer::new(),
            io_timeout,
            _state: PhantomData,
        }
    }

    /// Performs the TLS handshake, consuming the plaintext channel.
    ///
    /// Bytes the server sent after the reply that triggered the upgrade are
    /// discarded: they arrived unauthenticated and must not be read as
    /// replies on the secured channel.
    ///
    /// # Errors
    ///
    /// Returns the upgrader's error (normally [`Error::TlsHandshake`]) or
    /// [`Error::Timeout`] if the handshake exceeds `limit`. The plaintext
    /// stream has been dropped in either case.
    pub async fn upgrade<U>(
        self,
        upgrader: &U,
        limit: Duration,
    ) -> Result<SmtpChannel<U::Stream, Secured>>
    where
        U: TlsUpgrader<S>,
    {
        let Self {
            stream,
            framer,
            io_timeout,
            ..
        } = self;

        if framer.residual_len() > 0 || framer.has_partial_block() {
            tracing::warn!(
                bytes = framer.residual_len(),
                "discarding plaintext data received before TLS upgrade"
            );
        }

        let stream = timeout(limit, upgrader.upgrade(stream))
            .await
            .map_err(|_| Error::Timeout(limit))??;

        Ok(SmtpChannel {
            stream,
            framer: ResponseFramer::new(),
            io_timeout,
            _state: PhantomData,
        })
    }
}

impl<S> SmtpChannel<S, Secured> {
    /// Returns the TLS stream, e.g. to inspect the negotiated session.
    pub const fn stream(&self) -> &S {
        &self.stream
    }
}

// Common implementation for all states
impl<S, State> SmtpChannel<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the next complete reply block.
    ///
    /// # Errors
    ///
    /// Returns any framer error, or [`Error::Timeout`] if no complete block
    /// arrives within the I/O deadline.
    pub async fn read_block(&mut self) -> Result<ResponseBlock> {
        let limit = self.io_timeout;
        timeout(limit, self.framer.next_block(&mut self.stream))
            .await
            .map_err(|_| Error::Timeout(limit))?
    }

    /// Writes a command line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the write fails or
    /// [`Error::Timeout`] if it does not complete in time.
    pub async fn send(&mut self, command: &Command) -> Result<()> {
        let limit = self.io_timeout;
        let data = command.serialize();
        let stream = &mut self.stream;
        timeout(limit, async move {
            stream.write_all(&data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout(limit))??;
        Ok(())
    }

    /// Reads one reply block and records it.
    ///
    /// # Errors
    ///
    /// See [`read_block`](Self::read_block).
    pub async fn receive<T>(&mut self, sink: &mut T) -> Result<ResponseBlock>
    where
        T: TranscriptSink + ?Sized,
    {
        let block = self.read_block().await?;
        tracing::debug!(lines = block.lines().len(), code = ?block.code(), "S: {}", block);
        sink.reply(&block);
        Ok(block)
    }

    /// Sends a command and waits for its complete reply, recording both.
    ///
    /// The next command is never sent before this returns, so commands are
    /// not pipelined.
    ///
    /// # Errors
    ///
    /// Returns the first write or read error.
    pub async fn exchange<T>(&mut self, command: &Command, sink: &mut T) -> Result<ResponseBlock>
    where
        T: TranscriptSink + ?Sized,
    {
        self.send(command).await?;
        tracing::debug!("C: {}", command);
        sink.command(command);
        self.receive(sink).await
    }

    /// Shuts the stream down and drops it.
    ///
    /// Shutdown failures are logged, not returned, so they never replace
    /// the error that ended the session. Taking `self` by value means a
    /// channel can only be closed once.
    pub async fn close(mut self) {
        match timeout(self.io_timeout, self.stream.shutdown()).await {
            Ok(Ok(())) => tracing::debug!("connection closed"),
            Ok(Err(e)) => tracing::warn!(?e, "error while closing connection"),
            Err(_) => tracing::warn!("timed out closing connection"),
        }
    }
}
