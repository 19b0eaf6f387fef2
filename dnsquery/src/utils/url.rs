//! # DohUrl
//!
//! A DNS-over-HTTP endpoint, parsed with [`reqwest::Url`] and narrowed down
//! to what the transport can POST to.
//!
//! **Accepts** anything the WHATWG URL parser accepts, as long as:
//! - the scheme is `http` or `https` (any case)
//! - a host is present
//! - an explicit port, if any, is not 0
//!
//! Userinfo, trailing-dot names, underscores in host names, query strings and
//! fragments are all passed through to the HTTP client.
//!
//! ## Example
//!
//! ```rust
//! use dnsquery::utils::{DohUrl, HostType};
//!
//! let url: DohUrl = "http://127.0.0.1:8053/dns-query".parse().unwrap();
//! assert_eq!(url.host_type(), HostType::IPv4);
//! assert_eq!(url.port(), Some(8053));
//! assert_eq!(url.path(), "/dns-query");
//! ```
use reqwest::Url;
use std::str::FromStr;
use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr},
};
use thiserror::Error;

/// A validated endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DohUrl {
    url: Url,
    scheme: Scheme,
    host_type: HostType,
}

/// Represents the scheme of a URL (`http` or `https`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// Represents the type of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostType {
    Dns,
    IPv4,
    IPv6,
}

impl Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dns => write!(f, "dns"),
            Self::IPv4 => write!(f, "ipv4"),
            Self::IPv6 => write!(f, "ipv6"),
        }
    }
}

impl HostType {
    pub fn is_ipv4(host: &str) -> bool {
        Ipv4Addr::from_str(host).is_ok()
    }

    /// Expects the bracketed URL form, e.g. `[::1]`.
    pub fn is_ipv6(host: &str) -> bool {
        host.strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .is_some_and(|h| Ipv6Addr::from_str(h).is_ok())
    }

    /// Classifies a host already accepted by the URL parser.
    fn classify(host: &str) -> HostType {
        if Self::is_ipv4(host) {
            HostType::IPv4
        } else if Self::is_ipv6(host) {
            HostType::IPv6
        } else {
            HostType::Dns
        }
    }
}

/// Represents possible errors when parsing a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("The url is empty")]
    Empty,
    #[error("Malformed url `{url}`: {reason}")]
    Malformed { url: String, reason: String },
    #[error("Invalid scheme `{0}` => http:// or https://")]
    InvalidScheme(String),
    #[error("Missing host in `{0}`")]
    MissingHost(String),
    #[error("Invalid port `{0}` => (1 -> 65,535)")]
    InvalidPort(u16),
}

impl FromStr for DohUrl {
    type Err = UrlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DohUrl::new(s)
    }
}

impl TryFrom<&str> for DohUrl {
    type Error = UrlError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DohUrl::new(value)
    }
}

impl Display for DohUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl DohUrl {
    /// Parses and validates `input`.
    ///
    /// # Errors
    /// Returns [`UrlError`] if the URL is empty or unparsable, the scheme is
    /// not `http`/`https`, the host is missing or the port is 0.
    pub fn new(input: &str) -> Result<DohUrl, UrlError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UrlError::Empty);
        }

        let url = Url::parse(input).map_err(|e| UrlError::Malformed {
            url: input.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(UrlError::InvalidScheme(other.to_string())),
        };

        let host_type = match url.host_str() {
            Some(host) if !host.is_empty() => HostType::classify(host),
            _ => return Err(UrlError::MissingHost(input.to_string())),
        };

        if url.port() == Some(0) {
            return Err(UrlError::InvalidPort(0));
        }

        Ok(DohUrl {
            url,
            scheme,
            host_type,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host as the parser normalized it, brackets included for IPv6.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    /// Explicit, non-default port.
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Explicit port, or the scheme's default.
    pub fn effective_port(&self) -> u16 {
        self.url
            .port_or_known_default()
            .unwrap_or(self.scheme.default_port())
    }

    /// The normalized URL.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The parsed URL, ready to hand to an HTTP client.
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}
