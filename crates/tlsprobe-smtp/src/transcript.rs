//! Transcript sinks for probe sessions.
//!
//! Every command sent and every reply block received is handed to a
//! [`TranscriptSink`]. Sinks only observe: nothing they do affects the
//! session's control flow.
//!
//! # Example
//!
//! ```ignore
//! use tlsprobe_smtp::{Command, ResponseBlock, TranscriptSink};
//!
//! struct Stdout;
//!
//! impl TranscriptSink for Stdout {
//!     fn command(&mut self, command: &Command) {
//!         println!("C: {command}");
//!     }
//!
//!     fn reply(&mut self, reply: &ResponseBlock) {
//!         for line in reply.lines() {
//!             println!("S: {line}");
//!         }
//!     }
//! }
//! ```

use crate::command::Command;
use crate::connection::TlsInfo;
use crate::types::ResponseBlock;

/// Observer for the commands and replies of a session.
pub trait TranscriptSink {
    /// Called after a command line has been written.
    fn command(&mut self, command: &Command) {
        let _ = command;
    }

    /// Called when a complete reply block has been received.
    fn reply(&mut self, reply: &ResponseBlock) {
        let _ = reply;
    }

    /// Called once the TLS handshake has completed.
    fn secured(&mut self, tls: Option<&TlsInfo>) {
        let _ = tls;
    }
}

/// A sink that ignores the transcript.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TranscriptSink for NoopSink {}

/// A sink that emits the transcript as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl TranscriptSink for LoggingSink {
    fn command(&mut self, command: &Command) {
        tracing::info!("C: {command}");
    }

    fn reply(&mut self, reply: &ResponseBlock) {
        for line in reply.lines() {
            tracing::info!("S: {line}");
        }
    }

    fn secured(&mut self, tls: Option<&TlsInfo>) {
        match tls {
            Some(info) => tracing::info!(%info, "TLS established"),
            None => tracing::info!("TLS established"),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Command sent by the client.
    Command(Command),
    /// Reply block received from the server.
    Reply(ResponseBlock),
    /// TLS handshake completed.
    Secured(Option<TlsInfo>),
}

/// A sink that records the transcript in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns all entries in order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the commands sent, in order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Command(command) => Some(command),
            _ => None,
        })
    }

    /// Returns the replies received, in order.
    pub fn replies(&self) -> impl Iterator<Item = &ResponseBlock> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Reply(reply) => Some(reply),
            _ => None,
        })
    }

    /// Returns true if a TLS handshake completed during the session.
    #[must_use]
    pub fn is_secured(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, Entry::Secured(_)))
    }
}

impl TranscriptSink for Transcript {
    fn command(&mut self, command: &Command) {
        self.entries.push(Entry::Command(command.clone()));
    }

    fn reply(&mut self, reply: &ResponseBlock) {
        self.entries.push(Entry::Reply(reply.clone()));
    }

    fn secured(&mut self, tls: Option<&TlsInfo>) {
        self.entries.push(Entry::Secured(tls.cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseLine;

    #[test]
    fn test_transcript_keeps_order() {
        let mut transcript = Transcript::new();
        let greeting = ResponseBlock::new(vec![ResponseLine::new("220 ready")]).unwrap();
        transcript.reply(&greeting);
        transcript.command(&Command::Quit);
        transcript.secured(None);

        assert_eq!(transcript.entries().len(), 3);
        assert_eq!(transcript.commands().collect::<Vec<_>>(), vec![&Command::Quit]);
        assert_eq!(transcript.replies().collect::<Vec<_>>(), vec![&greeting]);
        assert!(transcript.is_secured());
    }
}
