//! # DNS codec and transports
//!
//! ## Modules
//!
//! - `name`: length-prefixed label encoding and bounds-checked name walking.
//! - `message`: header, flags, record type table, query encoding and
//!   response decoding.
//! - `resolver`: blocking UDP and DNS-over-HTTP transports (feature `std`).
//! - `formatter`: text and JSON rendering of decoded responses.
//!
//! ## Features
//!
//! - **`std`** (default): enables `resolver`. Without it the crate performs no
//!   I/O and can be paired with any transport.
//! - **`json`** (default): enables `formatter::JsonFormatter`.
//!
//! ## Quick Example
//!
//! ```rust
//! use dnsquery::dns::message::{decode_response, encode_query};
//!
//! let query = encode_query("example.com", "A").unwrap();
//! assert_eq!(query.len(), 29);
//!
//! // a reply is decoded the same way whichever transport carried it
//! let response = decode_response(&query).unwrap();
//! assert_eq!(response.id(), 0x1234);
//! assert!(response.records.is_empty());
//! ```

pub mod formatter;
pub mod message;
pub mod name;

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        pub mod resolver;
    }
}
