//! # tlsprobe-smtp
//!
//! Checks that an SMTP submission endpoint activates TLS correctly, either
//! implicitly (port 465) or through STARTTLS (port 587).
//!
//! ## Features
//!
//! - **Reply framing**: multiline replies reassembled from arbitrarily
//!   chunked reads, with partial blocks kept across reads
//! - **Type-state upgrade**: a plaintext channel is consumed by the TLS
//!   handshake, so it cannot be used afterwards
//! - **One state machine**: both TLS modes share the same command script
//! - **Deadlines**: connect, every read/write and the handshake are bounded
//!
//! ## Quick Start
//!
//! ```ignore
//! use tlsprobe_smtp::{Config, LoggingSink, Security, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("smtp.example.com", Security::StartTls);
//!     let session = Session::new(config)?;
//!
//!     let report = session.connect_and_run(&mut LoggingSink).await?;
//!     println!("secured with {:?}", report.tls);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: The commands the probe sends
//! - [`connection`]: Type-state channel, TLS upgrade and configuration
//! - [`framer`]: Reply block framing
//! - [`session`]: The session driver
//! - [`transcript`]: Transcript sinks
//! - [`types`]: Reply lines, blocks, codes and extensions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod framer;
pub mod session;
pub mod transcript;
pub mod types;

pub use command::Command;
pub use connection::{
    Config, ConfigBuilder, Plaintext, RustlsUpgrader, Secured, Security, SmtpChannel, TlsInfo,
    TlsUpgrader,
};
pub use error::{Error, Phase, Result, SessionError};
pub use framer::ResponseFramer;
pub use session::{Report, Session};
pub use transcript::{Entry, LoggingSink, NoopSink, Transcript, TranscriptSink};
pub use types::{Capabilities, Extension, ReplyCode, ResponseBlock, ResponseLine};
