//! SMTP extensions advertised in EHLO replies.

use std::fmt;

use super::ResponseBlock;

/// SMTP extension discovered from an EHLO reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// AUTH - SASL mechanisms, as advertised
    Auth(Vec<String>),
    /// SIZE - Maximum message size
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// PIPELINING - Command pipelining
    Pipelining,
    /// CHUNKING - Chunked message transfer
    Chunking,
    /// SMTPUTF8 - UTF-8 email addresses
    SmtpUtf8,
    /// DSN - Delivery status notifications
    Dsn,
    /// ENHANCEDSTATUSCODES - RFC 3463 status codes
    EnhancedStatusCodes,
    /// REQUIRETLS - RFC 8689
    RequireTls,
    /// Unknown extension
    Unknown(String),
}

impl Extension {
    /// Parses the text of one EHLO reply line (code prefix already removed).
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_ascii_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(parts.map(str::to_ascii_uppercase).collect()),
            "SIZE" => Self::Size(parts.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "CHUNKING" => Self::Chunking,
            "SMTPUTF8" => Self::SmtpUtf8,
            "DSN" => Self::Dsn,
            "ENHANCEDSTATUSCODES" => Self::EnhancedStatusCodes,
            "REQUIRETLS" => Self::RequireTls,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTls => f.write_str("STARTTLS"),
            Self::Auth(mechanisms) if mechanisms.is_empty() => f.write_str("AUTH"),
            Self::Auth(mechanisms) => write!(f, "AUTH {}", mechanisms.join(" ")),
            Self::Size(Some(size)) => write!(f, "SIZE {size}"),
            Self::Size(None) => f.write_str("SIZE"),
            Self::EightBitMime => f.write_str("8BITMIME"),
            Self::Pipelining => f.write_str("PIPELINING"),
            Self::Chunking => f.write_str("CHUNKING"),
            Self::SmtpUtf8 => f.write_str("SMTPUTF8"),
            Self::Dsn => f.write_str("DSN"),
            Self::EnhancedStatusCodes => f.write_str("ENHANCEDSTATUSCODES"),
            Self::RequireTls => f.write_str("REQUIRETLS"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Extensions advertised by one EHLO reply, in the order received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    extensions: Vec<Extension>,
}

impl Capabilities {
    /// Collects extensions from an EHLO reply.
    ///
    /// The first line carries the server's identity, not an extension.
    #[must_use]
    pub fn from_ehlo(reply: &ResponseBlock) -> Self {
        let extensions = reply
            .message()
            .into_iter()
            .skip(1)
            .map(Extension::parse)
            .collect();
        Self { extensions }
    }

    /// Returns the advertised extensions.
    #[must_use]
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Checks if the server advertises an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns true if nothing was advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ext) in self.extensions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ext}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ResponseLine;

    mod extension_parse_tests {
        use super::*;

        #[test]
        fn parse_starttls() {
            assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
            assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        }

        #[test]
        fn parse_auth() {
            assert_eq!(
                Extension::parse("AUTH plain LOGIN"),
                Extension::Auth(vec!["PLAIN".into(), "LOGIN".into()])
            );
        }

        #[test]
        fn parse_size() {
            assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
            assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        }

        #[test]
        fn parse_unknown_and_empty() {
            assert_eq!(
                Extension::parse("X-CUSTOM foo"),
                Extension::Unknown("X-CUSTOM foo".into())
            );
            assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
        }

        #[test]
        fn display_round_trips_keywords() {
            assert_eq!(Extension::parse("8BITMIME").to_string(), "8BITMIME");
            assert_eq!(Extension::parse("SIZE 100").to_string(), "SIZE 100");
            assert_eq!(Extension::parse("AUTH PLAIN").to_string(), "AUTH PLAIN");
        }
    }

    mod capabilities_tests {
        use super::*;

        fn ehlo(lines: &[&str]) -> ResponseBlock {
            ResponseBlock::new(lines.iter().copied().map(ResponseLine::new).collect()).unwrap()
        }

        #[test]
        fn skips_identity_line() {
            let caps = Capabilities::from_ehlo(&ehlo(&[
                "250-mx.example.com Hello",
                "250-PIPELINING",
                "250-SIZE 10240000",
                "250-STARTTLS",
                "250 HELP",
            ]));
            assert_eq!(caps.extensions().len(), 4);
            assert!(caps.supports_starttls());
            assert_eq!(caps.max_message_size(), Some(10_240_000));
            assert!(caps.supports(&Extension::Pipelining));
        }

        #[test]
        fn single_line_ehlo_has_no_extensions() {
            let caps = Capabilities::from_ehlo(&ehlo(&["250 mx.example.com"]));
            assert!(caps.is_empty());
            assert!(!caps.supports_starttls());
            assert_eq!(caps.to_string(), "");
        }

        #[test]
        fn display_lists_extensions() {
            let caps = Capabilities::from_ehlo(&ehlo(&["250-mx", "250-PIPELINING", "250 SIZE 10"]));
            assert_eq!(caps.to_string(), "PIPELINING, SIZE 10");
        }
    }
}
