//! Rendering of decoded responses for humans ([`TextFormatter`]) and for
//! scripts ([`JsonFormatter`], feature `json`).

use crate::dns::message::Response;
use std::fmt::Display;

/// Turns a query outcome into printable output.
pub trait ResponseFormatter {
    fn format(&self, response: &Response) -> String;

    fn format_error(&self, error: &dyn Display) -> String;

    /// Formats either side of a query result.
    fn render<E: Display>(&self, result: &Result<Response, E>) -> String
    where
        Self: Sized,
    {
        match result {
            Ok(response) => self.format(response),
            Err(e) => self.format_error(e),
        }
    }
}

/// Formats a response as the plain-text report printed by the CLI.
#[derive(Debug, Default)]
pub struct TextFormatter;

impl ResponseFormatter for TextFormatter {
    fn format(&self, response: &Response) -> String {
        let header = format!(
            "Transaction ID: {:#x}\nResponse Code: {}\nAnswers: {}",
            response.id(),
            response.rcode(),
            response.answer_count(),
        );

        std::iter::once(header)
            .chain(response.records.iter().map(|record| format!("  {record}")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_error(&self, error: &dyn Display) -> String {
        format!("Error: {error}")
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "json")] {
        use crate::dns::message::DnsHeaderFlags;
        use serde::Serialize;

        /// Formats a response as a single-line JSON object.
        #[derive(Debug, Default)]
        pub struct JsonFormatter;

        #[derive(Serialize)]
        struct ResponseReport {
            transaction_id: u16,
            flags: u16,
            questions: u16,
            answers: u16,
            authority: u16,
            additional: u16,
            rcode: u8,
            header_flags: FlagsReport,
            records: Vec<RecordReport>,
            truncated: bool,
            skipped: usize,
        }

        #[derive(Serialize)]
        struct FlagsReport {
            qr: bool,
            opcode: u8,
            aa: bool,
            tc: bool,
            rd: bool,
            ra: bool,
        }

        impl From<DnsHeaderFlags> for FlagsReport {
            fn from(flags: DnsHeaderFlags) -> Self {
                FlagsReport {
                    qr: flags.qr,
                    opcode: flags.opcode,
                    aa: flags.aa,
                    tc: flags.tc,
                    rd: flags.rd,
                    ra: flags.ra,
                }
            }
        }

        #[derive(Serialize)]
        struct RecordReport {
            #[serde(rename = "type")]
            record_type: &'static str,
            ttl: u32,
            ip: String,
        }

        #[derive(Serialize)]
        struct ErrorReport {
            error: String,
        }

        impl ResponseFormatter for JsonFormatter {
            fn format(&self, response: &Response) -> String {
                let report = ResponseReport {
                    transaction_id: response.id(),
                    flags: response.flags(),
                    questions: response.question_count(),
                    answers: response.answer_count(),
                    authority: response.authority_count(),
                    additional: response.additional_count(),
                    rcode: response.rcode(),
                    header_flags: response.header_flags().into(),
                    records: response
                        .records
                        .iter()
                        .map(|r| RecordReport {
                            record_type: r.record_type().name(),
                            ttl: r.ttl,
                            ip: r.ip(),
                        })
                        .collect(),
                    truncated: response.truncated,
                    skipped: response.skipped,
                };

                serde_json::to_string(&report)
                    .unwrap_or_else(|e| self.format_error(&e))
            }

            fn format_error(&self, error: &dyn Display) -> String {
                let report = ErrorReport {
                    error: error.to_string(),
                };
                serde_json::to_string(&report)
                    .unwrap_or_else(|_| String::from(r#"{"error":"unprintable error"}"#))
            }
        }
    }
}
