//! # Blocking transports
//!
//! Sends an encoded [`Query`] and hands the reply to
//! [`decode_response`](crate::dns::message::decode_response). Enabled with the
//! `std` feature.
//!
//! | transport         | wire                                          |
//! |-------------------|-----------------------------------------------|
//! | [`UdpTransport`]  | one datagram out, one datagram (≤ 512 B) back |
//! | [`DohTransport`]  | HTTP `POST` with an `application/dns-message` body |
//!
//! Each call performs exactly one exchange and blocks for at most the
//! configured timeout (5 seconds by default). There are no retries, no
//! fallback servers and no state shared between calls: sockets and HTTP
//! clients are owned by the call (or the transport value) and released when
//! they go out of scope.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dnsquery::dns::resolver::{send_doh_query, send_udp_query};
//!
//! match send_udp_query("example.com", "A", "127.0.0.1", 53) {
//!     Ok(response) => {
//!         for record in &response.records {
//!             println!("{record}");
//!         }
//!     }
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//!
//! let _ = send_doh_query("example.com", "AAAA", "http://127.0.0.1:8053/dns-query");
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`QueryError`]. Timeouts are reported as
//! [`QueryError::Timeout`] for both transports so callers can tell them apart
//! from decode errors and from other transport failures.

pub mod doh;
pub mod udp;

pub use self::doh::DohTransport;
pub use self::udp::UdpTransport;

use crate::dns::message::response::DecodeError;
use crate::dns::message::{Query, Response, TransactionId, decode_response};
use crate::dns::name::NameError;
use crate::utils::UrlError;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default DNS port.
pub const DEFAULT_PORT: u16 = 53;

/// How long a single exchange may block.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest UDP response read without EDNS(0).
pub const MAX_UDP_RESPONSE_SIZE: usize = 512;

/// Per-call knobs shared by both transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Upper bound for the whole exchange. Must be non-zero.
    pub timeout: Duration,
    /// Receive buffer for UDP; longer datagrams are cut off by the socket.
    pub udp_buffer_size: usize,
    /// Transaction id policy for the outgoing query.
    pub id: TransactionId,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            udp_buffer_size: MAX_UDP_RESPONSE_SIZE,
            id: TransactionId::default(),
        }
    }
}

/// Errors returned by the transports.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No reply within the timeout window.
    #[error("timed out waiting for a response from {peer}")]
    Timeout { peer: String },
    /// Connection, name resolution or client setup failure.
    #[error("transport failure: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The DoH endpoint answered with something other than `200 OK`.
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("invalid DoH url: {0}")]
    InvalidUrl(#[from] UrlError),
    #[error("cannot encode query: {0}")]
    Encode(#[from] NameError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout { .. })
    }
}

/// A way of exchanging one encoded message for one raw reply.
pub trait DnsTransport {
    fn send(&self, message: &[u8]) -> Result<Vec<u8>, QueryError>;

    fn protocol_name(&self) -> &'static str;
}

/// Either transport, picked at run time.
pub enum Transport {
    Udp(UdpTransport),
    Doh(DohTransport),
}

impl DnsTransport for Transport {
    fn send(&self, message: &[u8]) -> Result<Vec<u8>, QueryError> {
        match self {
            Self::Udp(t) => t.send(message),
            Self::Doh(t) => t.send(message),
        }
    }

    fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(t) => t.protocol_name(),
            Self::Doh(t) => t.protocol_name(),
        }
    }
}

/// Encodes `query`, sends it over `transport` and decodes the reply.
///
/// A reply whose transaction id differs from the query's is still returned;
/// the mismatch is logged at `warn` and left to the caller. So are replies
/// with QR clear or TC set.
pub fn resolve<T: DnsTransport + ?Sized>(
    transport: &T,
    query: &Query,
) -> Result<Response, QueryError> {
    let message = query.encode()?;
    let raw = transport.send(&message)?;

    debug!(
        protocol = transport.protocol_name(),
        sent = message.len(),
        received = raw.len(),
        "DNS exchange complete"
    );

    let response = decode_response(&raw)?;
    let flags = response.header_flags();
    if !flags.qr {
        warn!(id = response.id(), "reply is not marked as a response (QR=0)");
    }
    if flags.tc {
        warn!(
            protocol = transport.protocol_name(),
            "reply has the TC bit set; answers may be incomplete"
        );
    }
    if response.id() != query.id() {
        warn!(
            expected = query.id(),
            received = response.id(),
            "response transaction id does not match the query"
        );
    }

    Ok(response)
}

/// Queries `server:port` over UDP with the default options.
pub fn send_udp_query(
    domain: &str,
    qtype: &str,
    server: &str,
    port: u16,
) -> Result<Response, QueryError> {
    send_udp_query_with(domain, qtype, server, port, &ResolverOptions::default())
}

pub fn send_udp_query_with(
    domain: &str,
    qtype: &str,
    server: &str,
    port: u16,
    options: &ResolverOptions,
) -> Result<Response, QueryError> {
    let transport = UdpTransport::lookup(server, port)?.with_options(options);
    resolve(&transport, &Query::new(domain, qtype).with_id(options.id))
}

/// Queries a DoH endpoint with the default options.
pub fn send_doh_query(domain: &str, qtype: &str, url: &str) -> Result<Response, QueryError> {
    send_doh_query_with(domain, qtype, url, &ResolverOptions::default())
}

pub fn send_doh_query_with(
    domain: &str,
    qtype: &str,
    url: &str,
    options: &ResolverOptions,
) -> Result<Response, QueryError> {
    let transport = DohTransport::with_options(url, options)?;
    resolve(&transport, &Query::new(domain, qtype).with_id(options.id))
}
