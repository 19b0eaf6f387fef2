//! UDP transport (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is, one datagram per query. Replies are read into a
//! 512-byte buffer by default; anything longer is cut off by the socket.

use super::{DnsTransport, QueryError, ResolverOptions};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use tracing::{debug, warn};

/// DNS over UDP transport
#[derive(Debug, Clone)]
pub struct UdpTransport {
    server_addr: SocketAddr,
    timeout: Duration,
    buffer_size: usize,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        let options = ResolverOptions::default();
        Self {
            server_addr,
            timeout: options.timeout,
            buffer_size: options.udp_buffer_size,
        }
    }

    /// Resolves `server` (an IP literal or a host name). The first IPv4
    /// address wins; IPv6 is used only when no IPv4 address exists.
    pub fn lookup(server: &str, port: u16) -> Result<Self, QueryError> {
        let addrs = (server, port)
            .to_socket_addrs()
            .map_err(|e| QueryError::Transport(format!("cannot resolve {server}: {e}")))?;

        let addr = prefer_ipv4(addrs)
            .ok_or_else(|| QueryError::Transport(format!("no address found for {server}")))?;

        debug!(server, resolved = %addr, "UDP server resolved");
        Ok(Self::new(addr))
    }

    pub fn with_options(mut self, options: &ResolverOptions) -> Self {
        self.timeout = options.timeout;
        self.buffer_size = options.udp_buffer_size;
        self
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }

    fn receive_error(&self, e: io::Error) -> QueryError {
        match e.kind() {
            // WouldBlock on unix, TimedOut on windows
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => QueryError::Timeout {
                peer: self.server_addr.to_string(),
            },
            _ => QueryError::Io(e),
        }
    }
}

fn prefer_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let mut fallback = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        fallback.get_or_insert(addr);
    }
    fallback
}

impl DnsTransport for UdpTransport {
    fn send(&self, message: &[u8]) -> Result<Vec<u8>, QueryError> {
        // closed on drop
        let socket = UdpSocket::bind(self.bind_addr())?;
        socket.set_read_timeout(Some(self.timeout))?;

        let bytes_sent = socket.send_to(message, self.server_addr)?;
        debug!(
            server = %self.server_addr,
            bytes_sent = bytes_sent,
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; self.buffer_size];
        let (bytes_received, from_addr) = socket
            .recv_from(&mut recv_buf)
            .map_err(|e| self.receive_error(e))?;

        if from_addr.ip() != self.server_addr.ip() {
            warn!(
                expected = %self.server_addr,
                received_from = %from_addr,
                "UDP response from unexpected source"
            );
        }

        recv_buf.truncate(bytes_received);

        debug!(
            server = %self.server_addr,
            bytes_received = bytes_received,
            "UDP response received"
        );

        Ok(recv_buf)
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_transport_creation() {
        let addr: SocketAddr = "8.8.8.8:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert_eq!(transport.server_addr(), addr);
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.buffer_size, 512);
        assert_eq!(transport.protocol_name(), "UDP");
    }

    #[test]
    fn test_udp_transport_ipv6_binds_ipv6() {
        let addr: SocketAddr = "[2001:4860:4860::8888]:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert!(transport.bind_addr().is_ipv6());
    }

    #[test]
    fn test_udp_transport_lookup_literal() {
        let transport = UdpTransport::lookup("127.0.0.1", 5353).unwrap();
        assert_eq!(transport.server_addr(), "127.0.0.1:5353".parse().unwrap());
    }

    #[test]
    fn test_udp_transport_lookup_ipv6_literal() {
        let transport = UdpTransport::lookup("::1", 53).unwrap();
        assert_eq!(transport.server_addr(), "[::1]:53".parse().unwrap());
    }

    #[test]
    fn test_prefer_ipv4_over_ipv6() {
        let v6: SocketAddr = "[::1]:53".parse().unwrap();
        let v6_other: SocketAddr = "[fe80::1]:53".parse().unwrap();
        let v4: SocketAddr = "127.0.0.1:53".parse().unwrap();

        assert_eq!(prefer_ipv4([v6, v4]), Some(v4));
        assert_eq!(prefer_ipv4([v6, v6_other]), Some(v6));
        assert_eq!(prefer_ipv4(Vec::new()), None);
    }

    #[test]
    fn test_udp_transport_with_options() {
        let options = ResolverOptions {
            timeout: Duration::from_millis(250),
            udp_buffer_size: 1232,
            ..ResolverOptions::default()
        };
        let transport = UdpTransport::new("127.0.0.1:53".parse().unwrap()).with_options(&options);
        assert_eq!(transport.timeout, Duration::from_millis(250));
        assert_eq!(transport.buffer_size, 1232);
    }

    #[test]
    fn test_receive_error_classification() {
        let transport = UdpTransport::new("127.0.0.1:53".parse().unwrap());
        let err = transport.receive_error(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(err.is_timeout());
        let err = transport.receive_error(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(matches!(err, QueryError::Io(_)));
    }
}
