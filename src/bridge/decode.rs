//! Response Decoder: raw runtime output → (status, headers, body).
//!
//! The runtime hands back one undifferentiated byte stream containing an
//! optional status line, optional headers, a blank-line separator, and a
//! body. Partial or malformed output is never dropped; the permissive
//! fallback treats the whole payload as a 200 body.

use super::response::{BridgedResponse, HeaderMap};

/// Marker header attached when a CSRF-mismatch body is detected, so the
/// surface can react without parsing JSON itself.
pub const CSRF_ERROR_HEADER: &str = "X-CSRF-Error";

/// Status used for an expired anti-forgery token ("page expired").
pub const CSRF_MISMATCH_STATUS: u16 = 419;

const SEPARATOR: &[u8] = b"\r\n\r\n";

/// Decode one runtime invocation's output. Pure transform, never fails.
pub fn decode(raw: &[u8]) -> BridgedResponse {
    let Some(split_at) = find_separator(raw) else {
        return decode_headerless(raw);
    };

    let head = String::from_utf8_lossy(&raw[..split_at]);
    let body = raw[split_at + SEPARATOR.len()..].to_vec();

    let mut status = 200;
    let mut headers = HeaderMap::new();

    let mut lines = head.split("\r\n");
    if let Some(first) = lines.next() {
        if let Some(code) = parse_status_line(first) {
            status = code;
        } else {
            parse_header_line(first, &mut headers);
        }
    }
    for line in lines {
        parse_header_line(line, &mut headers);
    }

    BridgedResponse::new(status, headers, body)
}

/// No blank-line separator: the whole payload is body. A bare JSON object
/// gets a synthesized content type, and a token-mismatch message inside it
/// is promoted to the distinguished "page expired" status.
fn decode_headerless(raw: &[u8]) -> BridgedResponse {
    let trimmed = raw.trim_ascii();

    if trimmed.starts_with(b"{") && trimmed.ends_with(b"}") {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(trimmed) {
            let mut headers = HeaderMap::new();
            headers.insert("Content-Type", "application/json");

            let mismatch = json
                .get("message")
                .and_then(serde_json::Value::as_str)
                .is_some_and(|m| m.contains("CSRF token mismatch"));
            if mismatch {
                headers.insert(CSRF_ERROR_HEADER, "true");
                return BridgedResponse::new(CSRF_MISMATCH_STATUS, headers, trimmed.to_vec());
            }
            return BridgedResponse::new(200, headers, trimmed.to_vec());
        }
        // Parse failure is not fatal: fall through to the generic branch.
    }

    BridgedResponse::new(200, HeaderMap::new(), trimmed.to_vec())
}

fn find_separator(raw: &[u8]) -> Option<usize> {
    raw.windows(SEPARATOR.len())
        .position(|window| window == SEPARATOR)
}

/// `HTTP/<ver> <code> <reason>` → code.
fn parse_status_line(line: &str) -> Option<u16> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn parse_header_line(line: &str, headers: &mut HeaderMap) {
    let Some(colon) = line.find(':') else { return };
    if colon == 0 {
        return;
    }
    let key = line[..colon].trim();
    let value = line[colon + 1..].trim();
    if key.eq_ignore_ascii_case("Set-Cookie") {
        // Appended, never overwritten: every cookie in one response counts.
        headers.append("Set-Cookie", value);
    } else {
        headers.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_yields_code() {
        let raw = b"HTTP/1.1 302 Found\r\nLocation: /home\r\n\r\n";
        let resp = decode(raw);
        assert_eq!(resp.status, 302);
        assert_eq!(resp.location(), Some("/home"));
    }

    #[test]
    fn headers_without_status_line_default_to_200() {
        let raw = b"Content-Type: text/html\r\nX-Frame-Options: DENY\r\n\r\n<p>hi</p>";
        let resp = decode(raw);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type(), "text/html");
        assert_eq!(resp.headers.get("X-Frame-Options"), Some("DENY"));
        assert_eq!(resp.body, b"<p>hi</p>");
    }

    #[test]
    fn unparseable_status_code_defaults_to_200() {
        let raw = b"HTTP/1.1 abc\r\n\r\nbody";
        let resp = decode(raw);
        assert_eq!(resp.status, 200);
    }

    #[test]
    fn missing_separator_keeps_whole_payload_as_body() {
        let raw = b"  partial interpreter output\n";
        let resp = decode(raw);
        assert_eq!(resp.status, 200);
        assert!(resp.headers.is_empty());
        assert_eq!(resp.body, b"partial interpreter output");
    }

    #[test]
    fn every_set_cookie_occurrence_is_preserved() {
        let raw = b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1; Path=/\r\nSet-Cookie: b=2; Path=/\r\nContent-Type: text/html\r\n\r\nok";
        let resp = decode(raw);
        assert_eq!(resp.set_cookies(), vec!["a=1; Path=/", "b=2; Path=/"]);
    }

    #[test]
    fn bare_json_gets_synthesized_content_type() {
        let raw = br#"{"status":"ok"}"#;
        let resp = decode(raw);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type(), "application/json");
        assert_eq!(resp.body, raw.to_vec());
    }

    #[test]
    fn csrf_mismatch_json_maps_to_419_with_marker() {
        let raw = br#"{"message":"CSRF token mismatch."}"#;
        let resp = decode(raw);
        assert_eq!(resp.status, CSRF_MISMATCH_STATUS);
        assert_eq!(resp.headers.get(CSRF_ERROR_HEADER), Some("true"));
        assert_eq!(resp.content_type(), "application/json");
    }

    #[test]
    fn invalid_json_falls_through_to_generic_body() {
        let raw = b"{not json at all}";
        let resp = decode(raw);
        assert_eq!(resp.status, 200);
        assert!(resp.headers.is_empty());
        assert_eq!(resp.body, raw.to_vec());
    }

    #[test]
    fn header_value_colons_are_kept() {
        let raw = b"HTTP/1.1 200 OK\r\nLocation: http://127.0.0.1/next\r\n\r\n";
        let resp = decode(raw);
        assert_eq!(resp.location(), Some("http://127.0.0.1/next"));
    }
}
