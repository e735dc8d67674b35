//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use tlsprobe_smtp::{Config, Security};

/// Probe an SMTP submission endpoint's TLS activation
#[derive(Parser, Debug)]
#[command(name = "tlsprobe")]
#[command(
    about = "Check implicit TLS (port 465) or STARTTLS (port 587) on an SMTP submission server",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Server hostname, also used to verify its certificate
    pub host: String,

    /// Submission port: 465 for implicit TLS, 587 for STARTTLS
    #[arg(value_parser = parse_submission_port)]
    pub port: u16,

    /// Identity sent with EHLO
    #[arg(long, default_value = "localhost")]
    pub client_name: String,

    /// Seconds allowed for the TCP connection
    #[arg(long, default_value_t = 30)]
    pub connect_timeout: u64,

    /// Seconds allowed for each read or write
    #[arg(long, default_value_t = 60)]
    pub io_timeout: u64,

    /// Seconds allowed for the TLS handshake
    #[arg(long, default_value_t = 30)]
    pub tls_timeout: u64,
}

impl Cli {
    /// Returns the security mode selected by the port.
    pub fn security(&self) -> Security {
        // The value parser only admits submission ports.
        Security::from_port(self.port).unwrap_or(Security::StartTls)
    }

    /// Builds the probe configuration.
    pub fn config(&self) -> Config {
        Config::builder(&self.host, self.security())
            .port(self.port)
            .client_name(&self.client_name)
            .connect_timeout(Duration::from_secs(self.connect_timeout))
            .io_timeout(Duration::from_secs(self.io_timeout))
            .tls_timeout(Duration::from_secs(self.tls_timeout))
            .build()
    }
}

fn parse_submission_port(value: &str) -> Result<u16, String> {
    let port: u16 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a port number"))?;
    match Security::from_port(port) {
        Some(_) => Ok(port),
        None => Err(format!(
            "port {port} is not a submission port (use 465 for implicit TLS or 587 for STARTTLS)"
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn implicit_port() {
        let cli = Cli::try_parse_from(["tlsprobe", "smtp.example.com", "465"]).unwrap();
        let config = cli.config();
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.port, 465);
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.client_name, "localhost");
    }

    #[test]
    fn starttls_port_with_options() {
        let cli = Cli::try_parse_from([
            "tlsprobe",
            "smtp.example.com",
            "587",
            "--client-name",
            "probe.example.net",
            "--io-timeout",
            "5",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.security, Security::StartTls);
        assert_eq!(config.client_name, "probe.example.net");
        assert_eq!(config.io_timeout, Duration::from_secs(5));
        assert_eq!(config.tls_timeout, Duration::from_secs(30));
    }

    #[test]
    fn other_ports_are_usage_errors() {
        let err = Cli::try_parse_from(["tlsprobe", "smtp.example.com", "25"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn non_numeric_port_is_usage_error() {
        let err = Cli::try_parse_from(["tlsprobe", "smtp.example.com", "smtps"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn missing_arguments_are_usage_errors() {
        let err = Cli::try_parse_from(["tlsprobe"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);

        let err = Cli::try_parse_from(["tlsprobe", "smtp.example.com"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
