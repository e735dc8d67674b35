//! SMTP connection management with type-state pattern.
//!
//! A session starts on a [`SmtpChannel<S, Plaintext>`]. The only way to get
//! a [`SmtpChannel<_, Secured>`] is [`SmtpChannel::upgrade`], which consumes
//! the plaintext channel and hands its stream to a [`TlsUpgrader`].

mod channel;
mod config;
mod stream;

pub use channel::{Plaintext, Secured, SmtpChannel};
pub use config::{Config, ConfigBuilder, Security};
pub use stream::{RustlsUpgrader, TlsInfo, TlsUpgrader, connect};
