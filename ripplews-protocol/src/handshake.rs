//! WebSocket opening handshake (RFC 6455 §4).
//!
//! Builds the HTTP Upgrade request, derives the expected
//! `Sec-WebSocket-Accept` value, and validates the server's response. All
//! functions are pure; the connection layer owns the socket and feeds raw
//! bytes in and out.

use crate::error::HandshakeError;
use crate::{RFC6455_GUID, WEBSOCKET_VERSION};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha1::{Digest, Sha1};
use std::collections::HashMap;

/// Builds the 24-character `Sec-WebSocket-Key` for one connection attempt.
///
/// The key is derived from a 16-byte seed: SHA-1, hex, base64, truncated to
/// 21 characters and padded with `A==` so it keeps the shape of a
/// base64-encoded 16-byte value. Some servers check the shape, so the padding
/// is load-bearing.
pub fn client_key(seed: [u8; 16]) -> String {
    let digest = hex::encode(Sha1::digest(seed));
    let mut key: String = BASE64.encode(digest.as_bytes()).chars().take(21).collect();
    key.push('A');
    key.push_str("==");
    key
}

/// Derives the `Sec-WebSocket-Accept` value the server must echo for `key`
/// (RFC 6455 §4.2.2): base64 of SHA-1 over the key concatenated with the
/// protocol GUID.
pub fn accept_for_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(RFC6455_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Builds the HTTP/1.1 Upgrade request for `host`, CRLF-delimited and
/// terminated by a blank line.
pub fn build_request(host: &str, key: &str) -> String {
    format!(
        "GET / HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: ripplews\r\n\
         Upgrade: WebSocket\r\n\
         Connection: Upgrade\r\n\
         Pragma: no-cache\r\n\
         Cache-Control: no-cache\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: {version}\r\n\r\n",
        version = WEBSOCKET_VERSION
    )
}

/// A parsed HTTP response: status code plus headers. The body, if any, is
/// ignored.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    headers: HashMap<String, String>,
}

impl HttpResponse {
    /// Parses the raw text of an HTTP response.
    ///
    /// Header names are lower-cased and values trimmed. Splitting stops at
    /// the first blank line.
    pub fn parse(raw: &str) -> Result<Self, HandshakeError> {
        let mut lines = raw.split("\r\n");
        let status_line = lines.next().unwrap_or("");
        let status = parse_status_line(status_line)?;

        let mut headers = HashMap::new();
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| HandshakeError::MalformedHeader(line.to_string()))?;
            headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(Self { status, headers })
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Matches `HTTP/(1.0|1.1) (\d{3})`.
fn parse_status_line(line: &str) -> Result<u16, HandshakeError> {
    let malformed = || HandshakeError::MalformedStatusLine(line.to_string());

    let rest = line.strip_prefix("HTTP/").ok_or_else(malformed)?;
    let rest = rest
        .strip_prefix("1.1")
        .or_else(|| rest.strip_prefix("1.0"))
        .ok_or_else(malformed)?;
    if !rest.starts_with(|c: char| c.is_ascii_whitespace()) {
        return Err(malformed());
    }

    let digits: String = rest.trim_start().chars().take(3).collect();
    if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(digits.parse().expect("three ascii digits"))
    } else {
        Err(malformed())
    }
}

/// Validates a parsed handshake response against RFC 6455 §4.2.2: status 101,
/// `Upgrade: websocket` and `Connection: upgrade` (case-insensitive values),
/// and an exact match on `Sec-WebSocket-Accept`.
///
/// `request` and `raw_response` are embedded in the error for diagnostics.
pub fn validate_response(
    response: &HttpResponse,
    expected_accept: &str,
    request: &str,
    raw_response: &str,
) -> Result<(), HandshakeError> {
    let reject = |reason: String| HandshakeError::Rejected {
        reason,
        request: request.to_string(),
        response: raw_response.to_string(),
    };

    if response.status != 101 {
        return Err(reject(format!(
            "expected status 101, got {}",
            response.status
        )));
    }

    match response.header("upgrade") {
        Some(v) if v.eq_ignore_ascii_case("websocket") => {}
        other => return Err(reject(format!("bad Upgrade header: {:?}", other))),
    }

    match response.header("connection") {
        Some(v) if v.eq_ignore_ascii_case("upgrade") => {}
        other => return Err(reject(format!("bad Connection header: {:?}", other))),
    }

    match response.header("sec-websocket-accept") {
        Some(v) if v == expected_accept => {}
        other => {
            return Err(reject(format!(
                "Sec-WebSocket-Accept mismatch: expected {:?}, got {:?}",
                expected_accept, other
            )))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // canonical RFC 6455 §1.3 vector
    #[test]
    fn test_accept_derivation_vector() {
        assert_eq!(
            accept_for_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_client_key_shape() {
        let key = client_key([7u8; 16]);
        assert_eq!(key.len(), 24);
        assert!(key.ends_with("A=="));

        // deterministic per seed, distinct across seeds
        assert_eq!(key, client_key([7u8; 16]));
        assert_ne!(key, client_key([8u8; 16]));
    }

    #[test]
    fn test_build_request_headers() {
        let request = build_request("s1.ripple.com", "somekeyvalue");
        assert!(request.starts_with("GET / HTTP/1.1\r\n"));
        assert!(request.contains("Host: s1.ripple.com\r\n"));
        assert!(request.contains("Upgrade: WebSocket\r\n"));
        assert!(request.contains("Connection: Upgrade\r\n"));
        assert!(request.contains("Sec-WebSocket-Key: somekeyvalue\r\n"));
        assert!(request.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_parse_response() {
        let raw = "HTTP/1.1 101 Switching Protocols\r\n\
                   Upgrade: websocket\r\n\
                   Connection: Upgrade\r\n\
                   Sec-WebSocket-Accept: abc123\r\n\r\n";
        let response = HttpResponse::parse(raw).unwrap();
        assert_eq!(response.status, 101);
        assert_eq!(response.header("upgrade"), Some("websocket"));
        assert_eq!(response.header("Sec-WebSocket-Accept"), Some("abc123"));
    }

    #[test]
    fn test_parse_malformed_status_line() {
        for raw in ["", "garbage", "HTTP/2 101", "HTTP/1.1 10", "HTTP/1.1"] {
            assert!(
                matches!(
                    HttpResponse::parse(raw),
                    Err(HandshakeError::MalformedStatusLine(_))
                ),
                "{:?} must fail",
                raw
            );
        }
    }

    #[test]
    fn test_validate_accepts_conforming_response() {
        let key = "dGhlIHNhbXBsZSBub25jZQ==";
        let raw = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: WebSocket\r\n\
             Connection: upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            accept_for_key(key)
        );
        let response = HttpResponse::parse(&raw).unwrap();
        validate_response(&response, &accept_for_key(key), "req", &raw).unwrap();
    }

    #[test]
    fn test_validate_rejects_wrong_status() {
        let raw = "HTTP/1.1 200 OK\r\n\r\n";
        let response = HttpResponse::parse(raw).unwrap();
        let err = validate_response(&response, "whatever", "req", raw).unwrap_err();
        assert!(matches!(err, HandshakeError::Rejected { .. }));
        assert!(err.to_string().contains("got 200"));
    }

    #[test]
    fn test_validate_rejects_accept_mismatch() {
        let raw = "HTTP/1.1 101 Switching Protocols\r\n\
                   Upgrade: websocket\r\n\
                   Connection: Upgrade\r\n\
                   Sec-WebSocket-Accept: bogus\r\n\r\n";
        let response = HttpResponse::parse(raw).unwrap();
        let err = validate_response(&response, "expected-value", "req", raw).unwrap_err();
        assert!(err.to_string().contains("Sec-WebSocket-Accept"));
    }

    #[test]
    fn test_validate_rejects_missing_upgrade_header() {
        let raw = "HTTP/1.1 101 Switching Protocols\r\n\
                   Connection: Upgrade\r\n\r\n";
        let response = HttpResponse::parse(raw).unwrap();
        let err = validate_response(&response, "whatever", "req", raw).unwrap_err();
        assert!(err.to_string().contains("Upgrade"));
    }
}
