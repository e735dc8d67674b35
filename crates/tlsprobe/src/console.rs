//! Human-readable transcript output.

use std::io::{self, Write};

use tlsprobe_smtp::{Command, Report, ResponseBlock, TlsInfo, TranscriptSink};

/// Writes `C:` / `S:` transcript lines to a diagnostic stream.
///
/// Output errors are ignored: the transcript is informational and must not
/// end the session.
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<io::Stderr> {
    /// Creates a sink writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Creates a sink writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes a short summary of a completed session.
    pub fn summary(&mut self, report: &Report) {
        let _ = writeln!(self.out, "-- {} session completed", report.security);
        if let Some(tls) = &report.tls {
            let _ = writeln!(self.out, "-- TLS: {tls}");
        }
        if report.starttls_advertised == Some(false) {
            let _ = writeln!(
                self.out,
                "-- warning: STARTTLS was not advertised before the upgrade"
            );
        }
        if !report.capabilities.is_empty() {
            let _ = writeln!(self.out, "-- extensions: {}", report.capabilities);
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TranscriptSink for ConsoleSink<W> {
    fn command(&mut self, command: &Command) {
        let _ = writeln!(self.out, "C: {command}");
    }

    fn reply(&mut self, reply: &ResponseBlock) {
        for line in reply.lines() {
            let _ = writeln!(self.out, "S: {line}");
        }
    }

    fn secured(&mut self, tls: Option<&TlsInfo>) {
        let _ = match tls {
            Some(info) => writeln!(self.out, "-- TLS established ({info})"),
            None => writeln!(self.out, "-- TLS established"),
        };
    }
}
