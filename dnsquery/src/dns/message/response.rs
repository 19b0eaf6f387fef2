//! # Response decoding
//!
//! [`decode_response`] turns raw response bytes into a [`Response`]. The only
//! hard failure is a buffer too short to hold the header. Everything after
//! the header degrades instead of failing:
//!
//! - a question or answer name that runs past the buffer stops parsing;
//! - fewer than 10 bytes for an answer's fixed fields stops parsing;
//! - an RDLENGTH larger than what is left stops parsing;
//! - an answer that is not `A`/4 bytes or `AAAA`/16 bytes is consumed and
//!   skipped.
//!
//! A stop sets [`Response::truncated`]; a skip bumps [`Response::skipped`].
//! Records decoded before either event are always kept. Authority and
//! additional sections are never walked.

use super::{DnsHeaderFlags, HEADER_LEN, HeaderSection, RecordType};
use crate::dns::name;
use std::fmt::Display;
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use tracing::debug;

/// TYPE + CLASS + TTL + RDLENGTH.
const RR_FIXED_LEN: usize = 10;

/// QTYPE + QCLASS after a question name.
const QUESTION_TRAILER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Response too short ({len} bytes, need at least 12)")]
    TooShort { len: usize },
}

/// The decoded payload of an answer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
}

impl RecordData {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::Aaaa,
        }
    }
}

/// IPv4 as dotted quad; IPv6 as eight zero-padded lowercase hex groups with
/// no `::` shortening.
impl Display for RecordData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordData::A(ip) => write!(f, "{ip}"),
            RecordData::Aaaa(ip) => {
                let groups = ip.segments();
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{group:04x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A single decoded answer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Time-to-live of the record in seconds.
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// The address rendered as text.
    pub fn ip(&self) -> String {
        self.data.to_string()
    }
}

impl Display for ResourceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} (TTL: {})", self.record_type(), self.data, self.ttl)
    }
}

/// A decoded response message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: HeaderSection,
    /// Decoded `A`/`AAAA` answers in wire order.
    pub records: Vec<ResourceRecord>,
    /// Answer parsing stopped before `an_count` records were consumed.
    pub truncated: bool,
    /// Answers consumed but not decoded (other types or odd lengths).
    pub skipped: usize,
}

impl Response {
    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn flags(&self) -> u16 {
        self.header.flags
    }

    pub fn rcode(&self) -> u8 {
        self.header.rcode()
    }

    /// The flags word split into its fields.
    pub fn header_flags(&self) -> DnsHeaderFlags {
        self.header.decoded_flags()
    }

    pub fn question_count(&self) -> u16 {
        self.header.qd_count
    }

    pub fn answer_count(&self) -> u16 {
        self.header.an_count
    }

    pub fn authority_count(&self) -> u16 {
        self.header.ns_count
    }

    pub fn additional_count(&self) -> u16 {
        self.header.ar_count
    }
}

enum Answer {
    Decoded(ResourceRecord, usize),
    Skipped(usize),
    Truncated,
}

/// Decodes a response message.
///
/// # Errors
/// Returns [`DecodeError::TooShort`] if `bytes` cannot hold a header. Any
/// later malformation yields a partial [`Response`] instead.
pub fn decode_response(bytes: &[u8]) -> Result<Response, DecodeError> {
    let header =
        HeaderSection::from_bytes(bytes).ok_or(DecodeError::TooShort { len: bytes.len() })?;

    let mut response = Response {
        header,
        records: Vec::new(),
        truncated: false,
        skipped: 0,
    };

    let mut offset = HEADER_LEN;
    for _ in 0..header.qd_count {
        match name::skip_labels(bytes, offset) {
            Ok(end) => offset = end + QUESTION_TRAILER_LEN,
            Err(e) => {
                debug!(error = %e, "question section overruns the message");
                response.truncated = header.an_count > 0;
                return Ok(response);
            }
        }
    }

    for _ in 0..header.an_count {
        match read_answer(bytes, offset) {
            Answer::Decoded(record, end) => {
                response.records.push(record);
                offset = end;
            }
            Answer::Skipped(end) => {
                response.skipped += 1;
                offset = end;
            }
            Answer::Truncated => {
                debug!(offset, "answer section truncated");
                response.truncated = true;
                break;
            }
        }
    }

    debug!(
        id = header.id,
        rcode = header.rcode(),
        answers = response.records.len(),
        skipped = response.skipped,
        truncated = response.truncated,
        "decoded DNS response"
    );

    Ok(response)
}

fn read_answer(bytes: &[u8], offset: usize) -> Answer {
    let Ok(mut pos) = name::skip_name(bytes, offset) else {
        return Answer::Truncated;
    };

    let Some(fixed) = bytes.get(pos..pos + RR_FIXED_LEN) else {
        return Answer::Truncated;
    };
    let rtype = u16::from_be_bytes([fixed[0], fixed[1]]);
    // fixed[2..4] is CLASS, not interpreted
    let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
    let rd_length = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;
    pos += RR_FIXED_LEN;

    let Some(r_data) = bytes.get(pos..pos + rd_length) else {
        return Answer::Truncated;
    };
    pos += rd_length;

    let data = match (RecordType::from_code(rtype), r_data.len()) {
        (Some(RecordType::A), 4) => {
            RecordData::A(Ipv4Addr::new(r_data[0], r_data[1], r_data[2], r_data[3]))
        }
        (Some(RecordType::Aaaa), 16) => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(r_data);
            RecordData::Aaaa(Ipv6Addr::from(octets))
        }
        _ => return Answer::Skipped(pos),
    };

    Answer::Decoded(ResourceRecord { ttl, data }, pos)
}
