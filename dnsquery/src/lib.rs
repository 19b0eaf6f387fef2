//! # dnsquery
//!
//! A minimal DNS message codec with blocking transports.
//!
//! - **Codec**: builds a standard query (one question, class `IN`,
//!   recursion desired) and decodes `A`/`AAAA` answers out of a response.
//! - **Transport**: sends the query in a UDP datagram or as the body of an
//!   HTTP `POST` (`application/dns-message`), with a 5 second timeout.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! dnsquery = "0.1"                                                         # codec + transports
//! dnsquery = { version = "0.1", default-features = false }                 # codec only
//! ```
//!
//! ```rust,no_run
//! # #[cfg(feature = "std")]
//! # {
//! use dnsquery::dns::resolver::send_udp_query;
//!
//! match send_udp_query("example.com", "A", "127.0.0.1", 53) {
//!     Ok(response) => {
//!         println!("Transaction ID: {:#x}", response.id());
//!         for record in &response.records {
//!             println!("  {record}");
//!         }
//!     }
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! # }
//! ```
//!
//! ## Decoding policy
//!
//! Only a message shorter than the 12-byte header is rejected. Past the
//! header, the decoder stops at the first answer it cannot read in full and
//! skips answers that are not `A` or `AAAA`, returning whatever it decoded.
//! Answer owner names that are compression pointers are skipped, not
//! followed.
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events at `debug`
//! (encode, decode, send, receive) and `warn` (unexpected reply source,
//! transaction id mismatch). Install a subscriber to see them.
//!
//! ## License
//!
//! MIT

pub mod dns;

pub mod utils;
