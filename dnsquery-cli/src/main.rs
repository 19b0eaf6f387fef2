use anyhow::Context;
use clap::Parser;
use dnsquery::dns::formatter::{JsonFormatter, ResponseFormatter, TextFormatter};
use dnsquery::dns::message::TransactionId;
use dnsquery::dns::resolver::{self, DEFAULT_PORT, ResolverOptions};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dnsquery")]
#[command(version)]
#[command(about = "Send one DNS query over UDP or DNS-over-HTTP and print the answers")]
struct Cli {
    /// Domain to query
    domain: String,

    /// Query type (A, AAAA, CNAME, MX, TXT); unknown types are sent as A
    #[arg(short = 't', long = "type", default_value = "A")]
    qtype: String,

    /// DNS server address
    #[arg(short = 's', long, default_value = "127.0.0.1")]
    server: String,

    /// DNS server port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// DoH URL (e.g. http://127.0.0.1:8053/dns-query); sends the query as an HTTP POST
    #[arg(long, value_name = "URL")]
    doh: Option<String>,

    /// Use a random transaction id instead of 0x1234
    #[arg(long)]
    random_id: bool,

    /// Seconds to wait for a reply
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the result as a JSON object
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn options(&self) -> ResolverOptions {
        ResolverOptions {
            timeout: Duration::from_secs(self.timeout),
            id: if self.random_id {
                TransactionId::Random
            } else {
                TransactionId::default()
            },
            ..ResolverOptions::default()
        }
    }

    fn describe(&self) -> String {
        match &self.doh {
            Some(url) => format!("Querying {} ({}) via DoH: {}", self.domain, self.qtype, url),
            None => format!(
                "Querying {} ({}) via UDP: {}:{}",
                self.domain, self.qtype, self.server, self.port
            ),
        }
    }
}

fn init_logging(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}`"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;
    debug!(?cli, "parsed arguments");

    let options = cli.options();
    info!("{}", cli.describe());

    let result = match &cli.doh {
        Some(url) => resolver::send_doh_query_with(&cli.domain, &cli.qtype, url, &options),
        None => resolver::send_udp_query_with(
            &cli.domain,
            &cli.qtype,
            &cli.server,
            cli.port,
            &options,
        ),
    };

    if let Err(e) = &result {
        debug!(error = ?e, "query failed");
    }

    // query failures are reported, not propagated: the exit status stays 0
    if cli.json {
        println!("{}", JsonFormatter.render(&result));
    } else {
        println!("{}", cli.describe());
        println!("\nResult:");
        println!("{}", TextFormatter.render(&result));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["dnsquery", "example.com"]).unwrap();
        assert_eq!(cli.qtype, "A");
        assert_eq!(cli.server, "127.0.0.1");
        assert_eq!(cli.port, 53);
        assert!(cli.doh.is_none());
        assert!(!cli.json);

        let options = cli.options();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.id, TransactionId::Fixed(0x1234));
        assert_eq!(
            cli.describe(),
            "Querying example.com (A) via UDP: 127.0.0.1:53"
        );
    }

    #[test]
    fn test_cli_doh_and_flags() {
        let cli = Cli::try_parse_from([
            "dnsquery",
            "example.com",
            "-t",
            "aaaa",
            "--doh",
            "http://127.0.0.1:8053/dns-query",
            "--random-id",
            "--timeout",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.qtype, "aaaa");
        assert_eq!(cli.options().id, TransactionId::Random);
        assert_eq!(cli.options().timeout, Duration::from_secs(2));
        assert_eq!(
            cli.describe(),
            "Querying example.com (aaaa) via DoH: http://127.0.0.1:8053/dns-query"
        );
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["dnsquery", "example.com", "--timeout", "0"]).is_err());
    }
}
