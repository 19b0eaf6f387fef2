#![cfg(feature = "std")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dnsquery::dns::message::{RecordType, TransactionId};
use dnsquery::dns::resolver::{
    QueryError, ResolverOptions, send_doh_query, send_doh_query_with, send_udp_query,
    send_udp_query_with,
};

fn short_timeout() -> ResolverOptions {
    ResolverOptions {
        timeout: Duration::from_millis(300),
        ..ResolverOptions::default()
    }
}

/// Turns a query into a reply carrying one compressed-name answer.
fn reply_to(query: &[u8], rtype: u16, r_data: &[u8]) -> Vec<u8> {
    let mut reply = query.to_vec();
    reply[2] = 0x81;
    reply[3] = 0x80;
    reply[6..8].copy_from_slice(&1u16.to_be_bytes());
    reply.extend_from_slice(&[0xC0, 0x0C]);
    reply.extend_from_slice(&rtype.to_be_bytes());
    reply.extend_from_slice(&1u16.to_be_bytes());
    reply.extend_from_slice(&3600u32.to_be_bytes());
    reply.extend_from_slice(&(r_data.len() as u16).to_be_bytes());
    reply.extend_from_slice(r_data);
    reply
}

/// Answers a single UDP query, returning what it received.
fn spawn_udp_responder(r_data: Vec<u8>, rtype: u16) -> (u16, JoinHandle<Vec<u8>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let mut buf = [0u8; 512];
        let (len, peer) = socket.recv_from(&mut buf).unwrap();
        let query = buf[..len].to_vec();
        socket
            .send_to(&reply_to(&query, rtype, &r_data), peer)
            .unwrap();
        query
    });

    (port, handle)
}

#[test]
fn test_udp_query_round_trip() {
    let (port, server) = spawn_udp_responder(vec![93, 184, 216, 34], 1);

    let response = send_udp_query("example.com", "A", "127.0.0.1", port).unwrap();
    let query = server.join().unwrap();

    assert_eq!(&query[..2], &[0x12, 0x34]);
    assert_eq!(response.id(), 0x1234);
    assert_eq!(response.rcode(), 0);
    assert_eq!(response.answer_count(), 1);
    assert_eq!(response.records.len(), 1);
    assert_eq!(response.records[0].record_type(), RecordType::A);
    assert_eq!(response.records[0].ip(), "93.184.216.34");
    assert_eq!(response.records[0].ttl, 3600);
}

#[test]
fn test_udp_query_random_id_is_echoed() {
    let (port, server) = spawn_udp_responder(vec![0u8; 16], 28);
    let options = ResolverOptions {
        id: TransactionId::Random,
        ..short_timeout()
    };

    let response =
        send_udp_query_with("example.com", "aaaa", "127.0.0.1", port, &options).unwrap();
    let query = server.join().unwrap();

    assert_eq!(response.id(), u16::from_be_bytes([query[0], query[1]]));
    assert_eq!(
        response.records[0].ip(),
        "0000:0000:0000:0000:0000:0000:0000:0000"
    );
}

#[test]
fn test_udp_query_times_out() {
    // bound but never read from
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();

    let err = send_udp_query_with("example.com", "A", "127.0.0.1", port, &short_timeout())
        .unwrap_err();

    assert!(err.is_timeout(), "expected a timeout, got {err:?}");
    assert!(err.to_string().contains("timed out"));
}

#[test]
fn test_udp_short_reply_is_decode_error() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let mut buf = [0u8; 512];
        let (_, peer) = socket.recv_from(&mut buf).unwrap();
        socket.send_to(&[0x12, 0x34, 0x81], peer).unwrap();
    });

    let err = send_udp_query_with("example.com", "A", "127.0.0.1", port, &short_timeout())
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, QueryError::Decode(_)));
    assert!(err.to_string().starts_with("Response too short"));
}

struct HttpExchange {
    head: String,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> HttpExchange {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "client closed before sending the body");
        buf.extend_from_slice(&chunk[..n]);
    }

    HttpExchange {
        head,
        body: buf[header_end..header_end + content_length].to_vec(),
    }
}

/// Serves one HTTP request; `respond` maps the request body to (status line, body).
fn spawn_http_responder<F>(respond: F) -> (u16, JoinHandle<HttpExchange>)
where
    F: FnOnce(&[u8]) -> (&'static str, Vec<u8>) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let exchange = read_request(&mut stream);
        let (status, body) = respond(&exchange.body);

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/dns-message\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();
        exchange
    });

    (port, handle)
}

#[test]
fn test_doh_query_round_trip() {
    let (port, server) =
        spawn_http_responder(|query| ("200 OK", reply_to(query, 1, &[10, 1, 2, 3])));
    let url = format!("http://127.0.0.1:{port}/dns-query");

    let response = send_doh_query("example.com", "A", &url).unwrap();
    let exchange = server.join().unwrap();

    let head = exchange.head.to_ascii_lowercase();
    assert!(head.starts_with("post /dns-query http/1.1"));
    assert!(head.contains("content-type: application/dns-message"));
    assert!(head.contains("accept: application/dns-message"));
    assert_eq!(
        exchange.body,
        dnsquery::dns::message::encode_query("example.com", "A").unwrap()
    );

    assert_eq!(response.records.len(), 1);
    assert_eq!(response.records[0].ip(), "10.1.2.3");
}

#[test]
fn test_doh_query_accepts_lenient_url() {
    let (port, server) =
        spawn_http_responder(|query| ("200 OK", reply_to(query, 1, &[10, 9, 8, 7])));
    let url = format!("HTTP://user:pw@127.0.0.1:{port}/dns-query#resolver");

    let response = send_doh_query("example.com", "A", &url).unwrap();
    let exchange = server.join().unwrap();

    assert!(exchange.head.to_ascii_lowercase().starts_with("post /dns-query http/1.1"));
    assert_eq!(response.records[0].ip(), "10.9.8.7");
}

#[test]
fn test_doh_non_200_is_http_status_error() {
    let (port, server) = spawn_http_responder(|_| ("404 Not Found", Vec::new()));
    let url = format!("http://127.0.0.1:{port}/dns-query");

    let err = send_doh_query("example.com", "A", &url).unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, QueryError::HttpStatus(404)));
    assert_eq!(err.to_string(), "HTTP 404");
}

#[test]
fn test_doh_connection_refused_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}/dns-query");

    let err = send_doh_query_with("example.com", "A", &url, &short_timeout()).unwrap_err();

    assert!(matches!(err, QueryError::Transport(_)), "got {err:?}");
    assert!(
        err.to_string().contains("onnection refused"),
        "missing OS reason in `{err}`"
    );
}

#[test]
fn test_doh_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        // hold the connection open without answering
        let (_stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(3));
    });
    let url = format!("http://127.0.0.1:{port}/dns-query");

    let err = send_doh_query_with("example.com", "A", &url, &short_timeout()).unwrap_err();

    assert!(err.is_timeout(), "expected a timeout, got {err:?}");
}

#[test]
fn test_doh_invalid_url() {
    let err = send_doh_query("example.com", "A", "127.0.0.1:8053").unwrap_err();
    assert!(matches!(err, QueryError::InvalidUrl(_)));
}
