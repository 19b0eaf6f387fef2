//! DNS-over-HTTP transport (RFC 8484 §4.1, POST only)
//!
//! ```text
//! POST /dns-query HTTP/1.1
//! Content-Type: application/dns-message
//! Accept: application/dns-message
//!
//! <raw DNS message bytes>
//! ```
//!
//! Plain `http://` endpoints are accepted for lab and LAN resolvers. Only a
//! `200 OK` reply is treated as a DNS message. Requests go straight to the
//! endpoint; proxy environment variables are ignored.

use super::{DnsTransport, QueryError, ResolverOptions};
use crate::utils::DohUrl;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::error::Error;
use tracing::debug;

/// Media type for wire-format DNS messages (RFC 8484 §6).
pub const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

/// DNS-over-HTTP(S) transport
pub struct DohTransport {
    url: DohUrl,
    client: Client,
}

impl DohTransport {
    pub fn new(url: &str) -> Result<Self, QueryError> {
        Self::with_options(url, &ResolverOptions::default())
    }

    pub fn with_options(url: &str, options: &ResolverOptions) -> Result<Self, QueryError> {
        let url = DohUrl::new(url)?;
        let client = Client::builder()
            .use_rustls_tls()
            .no_proxy()
            .timeout(options.timeout)
            .build()
            .map_err(|e| QueryError::Transport(error_chain(&e)))?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &DohUrl {
        &self.url
    }

    fn request_error(&self, e: reqwest::Error) -> QueryError {
        if e.is_timeout() {
            QueryError::Timeout {
                peer: self.url.to_string(),
            }
        } else {
            QueryError::Transport(error_chain(&e))
        }
    }
}

impl DnsTransport for DohTransport {
    fn send(&self, message: &[u8]) -> Result<Vec<u8>, QueryError> {
        debug!(
            url = %self.url,
            message_len = message.len(),
            "Sending DoH query"
        );

        let response = self
            .client
            .post(self.url.as_url().clone())
            .header(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .header(ACCEPT, DNS_MESSAGE_CONTENT_TYPE)
            .body(message.to_vec())
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %self.url, status = status.as_u16(), "DoH request rejected");
            return Err(QueryError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().map_err(|e| self.request_error(e))?;

        debug!(
            url = %self.url,
            response_len = body.len(),
            "DoH response received"
        );

        Ok(body.to_vec())
    }

    fn protocol_name(&self) -> &'static str {
        "DoH"
    }
}

/// Flattens an error and its sources into one line.
fn error_chain(e: &dyn Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
