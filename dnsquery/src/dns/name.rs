//! # Domain name encoding
//!
//! Low-level helpers for the RFC 1035 §3.1 name representation used by the
//! codec: a sequence of length-prefixed labels closed by a zero octet.
//!
//! ```text
//!   +---+---+---+---+---+---+---+---+---+---+---+---+---+
//!   | 3 | w | w | w | 7 | e | x | a | m | p | l | e | 0 |
//!   +---+---+---+---+---+---+---+---+---+---+---+---+---+
//! ```
//!
//! Every reader here is a pure function of `(bytes, offset)` that either
//! returns the offset just past the name or a [`NameError`]. No reader indexes
//! the buffer directly, so a message whose section counts disagree with its
//! content can only ever produce an error, never a panic.
//!
//! Compression pointers (RFC 1035 §4.1.4) are recognised only at the start of
//! an answer owner name and are skipped, never followed. See [`skip_name`].

use thiserror::Error;

/// Maximum length of a single label (RFC 1035 §2.3.4).
pub const MAX_LABEL_LEN: usize = 63;

/// The two high bits that mark a compression pointer.
pub const POINTER_MASK: u8 = 0xC0;

/// Offset of the first question name inside a message.
const QUESTION_OFFSET: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// A label does not fit in the 6-bit length prefix.
    #[error("label `{0}` is longer than 63 bytes")]
    LabelTooLong(String),
    /// Labels are written as raw ASCII; IDNA is not supported.
    #[error("label `{0}` contains non-ASCII characters")]
    NonAscii(String),
    /// The name runs past the end of the buffer; carries the offset of the
    /// length octet or label that overruns it.
    #[error("name overruns the message at offset {0}")]
    OutOfBounds(usize),
}

/// Appends `domain` to `buf` as length-prefixed labels plus the root terminator.
///
/// Empty parts are dropped, so `"example.com."` and `"example.com"` encode
/// identically and `""` encodes the root name alone.
pub fn encode_name(domain: &str, buf: &mut Vec<u8>) -> Result<(), NameError> {
    for label in domain.split('.').filter(|l| !l.is_empty()) {
        if !label.is_ascii() {
            return Err(NameError::NonAscii(label.to_string()));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(NameError::LabelTooLong(label.to_string()));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    Ok(())
}

/// Reads the uncompressed name starting at `offset`.
///
/// Returns the labels and the offset just past the zero terminator. Every
/// non-zero octet is taken as a label length; pointers inside a label
/// sequence are not interpreted.
pub fn read_labels(bytes: &[u8], offset: usize) -> Result<(Vec<String>, usize), NameError> {
    let mut labels = Vec::new();
    let mut pos = offset;

    loop {
        let len = *bytes.get(pos).ok_or(NameError::OutOfBounds(pos))? as usize;
        if len == 0 {
            return Ok((labels, pos + 1));
        }

        let label = bytes
            .get(pos + 1..pos + 1 + len)
            .ok_or(NameError::OutOfBounds(pos))?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += len + 1;
    }
}

/// Like [`read_labels`] but without collecting the labels.
pub fn skip_labels(bytes: &[u8], offset: usize) -> Result<usize, NameError> {
    let mut pos = offset;

    loop {
        let len = *bytes.get(pos).ok_or(NameError::OutOfBounds(pos))? as usize;
        if len == 0 {
            return Ok(pos + 1);
        }
        if pos + 1 + len > bytes.len() {
            return Err(NameError::OutOfBounds(pos));
        }
        pos += len + 1;
    }
}

/// Skips an answer owner name.
///
/// A first octet with both high bits set is a two-byte compression pointer;
/// it is stepped over without being dereferenced. Anything else is walked as
/// a plain label sequence.
pub fn skip_name(bytes: &[u8], offset: usize) -> Result<usize, NameError> {
    let first = *bytes.get(offset).ok_or(NameError::OutOfBounds(offset))?;

    if first >= POINTER_MASK {
        if offset + 2 > bytes.len() {
            return Err(NameError::OutOfBounds(offset + 1));
        }
        return Ok(offset + 2);
    }

    skip_labels(bytes, offset)
}

/// Reads the first question name of `packet` back as a dotted string.
pub fn decode_question_labels(packet: &[u8]) -> Result<String, NameError> {
    let (labels, _) = read_labels(packet, QUESTION_OFFSET)?;
    Ok(labels.join("."))
}
