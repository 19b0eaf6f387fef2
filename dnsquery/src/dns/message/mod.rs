//! # DNS message model
//!
//! Wire-level building blocks shared by the query encoder and the response
//! decoder:
//!
//! - [`HeaderSection`]: the fixed 12-byte header (id, flags, four counts).
//! - [`DnsHeaderFlags`]: the 16-bit flags word, bit by bit.
//! - [`RecordType`]: the static QTYPE table (`A`, `AAAA`, `CNAME`, `MX`, `TXT`).
//! - [`Query`]: an immutable question plus the transaction id it goes out with.
//!
//! Responses live in [`response`].
//!
//! ## Example
//!
//! ```rust
//! use dnsquery::dns::message::{Query, TransactionId};
//!
//! let bytes = Query::new("example.com", "aaaa")
//!     .with_id(TransactionId::Fixed(0xBEEF))
//!     .encode()
//!     .unwrap();
//!
//! assert_eq!(&bytes[..2], &[0xBE, 0xEF]);
//! assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0x1C, 0x00, 0x01]);
//! ```

pub mod response;

pub use self::response::{RecordData, ResourceRecord, Response, decode_response};

use crate::dns::name::{self, NameError};
use std::fmt::Display;
use tracing::debug;

/// Size of the fixed message header.
pub const HEADER_LEN: usize = 12;

/// Transaction id sent when the caller does not ask for a random one.
pub const DEFAULT_TRANSACTION_ID: u16 = 0x1234;

/// QCLASS `IN`.
pub const CLASS_IN: u16 = 1;

mod internal {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Generates a random 16-bit ID for a DNS query.
    pub(crate) fn generate_id() -> u16 {
        let mut thread_rng = rand::rng();
        let mut rng = SmallRng::from_rng(&mut thread_rng);

        rng.random::<u16>()
    }
}

/// How the transaction id of a [`Query`] is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionId {
    /// Always send this id. Reproducible, but trivially spoofable.
    Fixed(u16),
    /// Draw a fresh id when the query is built.
    Random,
}

impl Default for TransactionId {
    fn default() -> Self {
        TransactionId::Fixed(DEFAULT_TRANSACTION_ID)
    }
}

impl TransactionId {
    fn resolve(self) -> u16 {
        match self {
            TransactionId::Fixed(id) => id,
            TransactionId::Random => internal::generate_id(),
        }
    }
}

/// A single standard query: one question, class `IN`, recursion desired.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    id: u16,
    domain: String,
    record_type: RecordType,
}

impl Query {
    /// Builds a query for `domain` with the default transaction id.
    ///
    /// `qtype` is looked up case-insensitively in the record type table; an
    /// unknown name silently becomes [`RecordType::A`].
    pub fn new(domain: &str, qtype: &str) -> Query {
        Query {
            id: DEFAULT_TRANSACTION_ID,
            domain: domain.to_string(),
            record_type: RecordType::lookup_or_default(qtype),
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Query {
        self.id = id.resolve();
        self
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Encodes header and question section into wire format.
    pub fn encode(&self) -> Result<Vec<u8>, NameError> {
        let header = HeaderSection {
            id: self.id,
            flags: DnsHeaderFlags {
                qr: false,
                opcode: OpCodeOptions::StandardQuery as u8,
                aa: false,
                tc: false,
                rd: true,
                ra: false,
                z: 0,
                rcode: 0,
            }
            .to_u16(),
            qd_count: 1,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        };

        let mut message = Vec::with_capacity(HEADER_LEN + self.domain.len() + 6);
        message.extend_from_slice(&header.to_bytes());
        name::encode_name(&self.domain, &mut message)?;
        message.extend_from_slice(&self.record_type.to_bytes());
        message.extend_from_slice(&CLASS_IN.to_be_bytes());

        debug!(
            id = self.id,
            domain = %self.domain,
            qtype = %self.record_type,
            len = message.len(),
            "encoded DNS query"
        );

        Ok(message)
    }
}

/// Encodes a query for `domain`/`qtype` with the fixed default transaction id.
pub fn encode_query(domain: &str, qtype: &str) -> Result<Vec<u8>, NameError> {
    Query::new(domain, qtype).encode()
}

/// Represents the header section of a DNS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSection {
    /// Identifier to match requests and responses.
    pub id: u16,
    /// Flags and control bits, see [`DnsHeaderFlags`].
    pub flags: u16,
    /// Number of entries in the question section.
    pub qd_count: u16,
    /// Number of resource records in the answer section.
    pub an_count: u16,
    /// Number of name server records in the authority section.
    pub ns_count: u16,
    /// Number of resource records in the additional section.
    pub ar_count: u16,
}

#[allow(clippy::wrong_self_convention)]
impl HeaderSection {
    /// Converts the header into a 12-byte array suitable for network transmission.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..2].copy_from_slice(&self.id.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.flags.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.qd_count.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.an_count.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.ns_count.to_be_bytes());
        bytes[10..12].copy_from_slice(&self.ar_count.to_be_bytes());
        bytes
    }

    /// Reads the header from the first 12 bytes of `bytes`.
    ///
    /// Returns `None` when fewer than 12 bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Option<HeaderSection> {
        let header = bytes.get(..HEADER_LEN)?;
        let word = |i: usize| u16::from_be_bytes([header[i], header[i + 1]]);

        Some(HeaderSection {
            id: word(0),
            flags: word(2),
            qd_count: word(4),
            an_count: word(6),
            ns_count: word(8),
            ar_count: word(10),
        })
    }

    /// Response code, the low four bits of the flags word.
    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }

    pub fn decoded_flags(&self) -> DnsHeaderFlags {
        DnsHeaderFlags::from_u16(self.flags)
    }
}

/// Represents the 16-bit DNS flags field (RFC 1035 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeaderFlags {
    /// Query/Response flag
    pub qr: bool,
    /// Operation code, see [`OpCodeOptions`]
    pub opcode: u8,
    /// Authoritative Answer
    pub aa: bool,
    /// Truncation flag
    pub tc: bool,
    /// Recursion Desired
    pub rd: bool,
    /// Recursion Available
    pub ra: bool,
    /// Reserved bits
    pub z: u8,
    /// Response code
    pub rcode: u8,
}

/// OPCODE values this crate sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCodeOptions {
    StandardQuery = 0,
}

impl DnsHeaderFlags {
    /// Encode the flags into a 16-bit integer.
    pub fn to_u16(self) -> u16 {
        ((self.qr as u16) << 15)
            | ((self.opcode as u16 & 0b1111) << 11)
            | ((self.aa as u16) << 10)
            | ((self.tc as u16) << 9)
            | ((self.rd as u16) << 8)
            | ((self.ra as u16) << 7)
            | ((self.z as u16 & 0b111) << 4)
            | (self.rcode as u16 & 0b1111)
    }

    /// Decode from a 16-bit integer into structured flags.
    pub fn from_u16(value: u16) -> Self {
        Self {
            qr: (value >> 15) & 1 != 0,
            opcode: ((value >> 11) & 0b1111) as u8,
            aa: (value >> 10) & 1 != 0,
            tc: (value >> 9) & 1 != 0,
            rd: (value >> 8) & 1 != 0,
            ra: (value >> 7) & 1 != 0,
            z: ((value >> 4) & 0b111) as u8,
            rcode: (value & 0b1111) as u8,
        }
    }
}

/// Record types the encoder knows by name. Only `A` and `AAAA` answers are
/// decoded into structured data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    // A host address
    A = 1,
    // The canonical name for an alias
    Cname = 5,
    // Mail exchange
    Mx = 15,
    // Text strings
    Txt = 16,
    // An IPv6 host address (RFC 3596)
    Aaaa = 28,
}

static RECORD_TYPES: &[(&str, RecordType)] = &[
    ("A", RecordType::A),
    ("AAAA", RecordType::Aaaa),
    ("CNAME", RecordType::Cname),
    ("MX", RecordType::Mx),
    ("TXT", RecordType::Txt),
];

#[allow(clippy::wrong_self_convention)]
impl RecordType {
    /// Looks up a mnemonic such as `"aaaa"` or `"MX"`, ignoring case.
    pub fn from_name(name: &str) -> Option<RecordType> {
        let upper = name.to_ascii_uppercase();
        RECORD_TYPES
            .iter()
            .find(|(mnemonic, _)| *mnemonic == upper)
            .map(|(_, ty)| *ty)
    }

    /// Same as [`RecordType::from_name`], falling back to `A`.
    pub fn lookup_or_default(name: &str) -> RecordType {
        RecordType::from_name(name).unwrap_or(RecordType::A)
    }

    pub fn from_code(code: u16) -> Option<RecordType> {
        RECORD_TYPES
            .iter()
            .find(|(_, ty)| *ty as u16 == code)
            .map(|(_, ty)| *ty)
    }

    pub fn name(self) -> &'static str {
        RECORD_TYPES
            .iter()
            .find(|(_, ty)| *ty == self)
            .map(|(mnemonic, _)| *mnemonic)
            .unwrap_or("A")
    }

    /// Encode the record type as a 2-byte big-endian value.
    pub fn to_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
