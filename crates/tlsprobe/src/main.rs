//! `tlsprobe` - SMTP submission TLS checker
//!
//! Connects to a submission server, activates TLS the way the port
//! requires (implicit on 465, STARTTLS on 587), re-identifies with EHLO and
//! quits, printing the conversation to stderr.
//!
//! Exit status: 0 when the session completed, 1 when it failed, 2 for
//! usage errors.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod console;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tlsprobe_smtp::{Report, Session, SessionError};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use console::ConsoleSink;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tlsprobe=info,tlsprobe_smtp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut console = ConsoleSink::stderr();
    let outcome = probe(&cli, &mut console).await;
    match &outcome {
        Ok(report) => {
            console.summary(report);
            info!(host = %cli.host, port = cli.port, "probe succeeded");
        }
        Err(e) => report_failure(e),
    }
    ExitCode::from(exit_status(&outcome))
}

async fn probe<W: Write>(cli: &Cli, console: &mut ConsoleSink<W>) -> anyhow::Result<Report> {
    let config = cli.config();
    let session = Session::new(config).with_context(|| format!("cannot probe {}", cli.host))?;
    let report = session.connect_and_run(console).await?;
    Ok(report)
}

/// Process exit status for a probe outcome: 0 on success, 1 on any failure.
///
/// Usage errors exit with 2 from argument parsing, before a probe starts.
fn exit_status(outcome: &anyhow::Result<Report>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// How a failed probe is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// The server answered STARTTLS with a refusal.
    Rejected,
    /// The server was reached but TLS could not be established.
    Tls,
    /// Anything else, including an unreachable server.
    Other,
}

fn classify(e: &anyhow::Error) -> Failure {
    match e.downcast_ref::<SessionError>() {
        Some(failure) if failure.source.is_rejection() => Failure::Rejected,
        Some(failure) if failure.source.is_tls_failure() => Failure::Tls,
        _ => match e.downcast_ref::<tlsprobe_smtp::Error>() {
            Some(err) if err.is_tls_failure() => Failure::Tls,
            _ => Failure::Other,
        },
    }
}

fn report_failure(e: &anyhow::Error) {
    let failure = e.downcast_ref::<SessionError>();
    let phase = failure.map(|f| f.phase.to_string());
    let phase = phase.as_deref().unwrap_or("setup");
    match classify(e) {
        Failure::Rejected => warn!(phase, "{e:#}"),
        Failure::Tls => error!(phase, "server reached but TLS failed: {e:#}"),
        Failure::Other => error!(phase, "{e:#}"),
    }
}
