//! HTTP/1.x start-line and header parsing over a growable buffer.
//!
//! Low-level token scanning (method/header-name/header-value byte classes,
//! CRLF delimiter search) is delegated to `httparse`; the growable-buffer
//! contract around it -- `NEED_MORE`/`COMPLETE`/`MALFORMED`, the 16 KiB
//! ceiling -- is this module's own. `parse_request` re-scans the whole
//! buffer on each call rather than resuming from a saved offset: `httparse`
//! does not expose re-entrant scanning state, so the caller's only lever
//! for reducing retries is reading larger chunks, not cheaper re-parses --
//! see [`crate::messenger::Messenger::read_head`].

use crate::error::ParseError;

const MAX_HEADERS: usize = 64;

/// The start-line and headers of a request, once fully parsed.
#[derive(Debug)]
pub struct ParsedHead {
    pub method: String,
    pub target: String,
    pub protocol: String,
    pub headers: Vec<(String, Vec<u8>)>,
    /// Offset into the scanned buffer immediately past the terminating
    /// blank line (the start of the body, if any).
    pub headers_end: usize,
}

/// The result of attempting to parse `buffer` as a request head.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Not enough bytes yet; the caller should read more and retry.
    NeedMore,
    /// A full start-line and header block was found.
    Complete(ParsedHead),
    /// `buffer` cannot be a valid request head.
    Malformed(ParseError),
}

/// Attempts to parse a request head out of `buffer`. `max_header_bytes`
/// bounds how large `buffer` may grow before an incomplete parse is
/// treated as `431` rather than retried.
pub fn parse_request(buffer: &[u8], max_header_bytes: usize) -> ParseOutcome {
    let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut raw_headers);

    match parsed.parse(buffer) {
        Ok(httparse::Status::Complete(headers_end)) => {
            let method = match parsed.method {
                Some(m) => m.to_string(),
                None => return ParseOutcome::Malformed(ParseError::Malformed("missing method")),
            };
            let target = match parsed.path {
                Some(p) => p.to_string(),
                None => return ParseOutcome::Malformed(ParseError::Malformed("missing request target")),
            };
            let protocol = match parsed.version {
                Some(v) => format!("HTTP/1.{}", v),
                None => return ParseOutcome::Malformed(ParseError::Malformed("missing HTTP version")),
            };
            let headers = parsed
                .headers
                .iter()
                .map(|h| (h.name.to_string(), h.value.to_vec()))
                .collect();

            ParseOutcome::Complete(ParsedHead {
                method,
                target,
                protocol,
                headers,
                headers_end,
            })
        }
        Ok(httparse::Status::Partial) => {
            if buffer.len() >= max_header_bytes {
                ParseOutcome::Malformed(ParseError::HeadersTooLarge)
            } else {
                ParseOutcome::NeedMore
            }
        }
        Err(_) => ParseOutcome::Malformed(ParseError::Malformed("invalid request head")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_request_needs_more() {
        let buf = b"GET /hello HTTP/1.1\r\nHost: x\r\n";
        match parse_request(buf, 16 * 1024) {
            ParseOutcome::NeedMore => {}
            other => panic!("expected NeedMore, got {:?}", other),
        }
    }

    #[test]
    fn complete_request_reports_offset_and_fields() {
        let buf = b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n";
        match parse_request(buf, 16 * 1024) {
            ParseOutcome::Complete(head) => {
                assert_eq!(head.method, "GET");
                assert_eq!(head.target, "/hello");
                assert_eq!(head.protocol, "HTTP/1.1");
                assert_eq!(head.headers, vec![("Host".to_string(), b"x".to_vec())]);
                assert_eq!(head.headers_end, buf.len());
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_headers_both_kept_in_order() {
        let buf = b"GET / HTTP/1.1\r\nX-A: 1\r\nX-A: 2\r\n\r\n";
        match parse_request(buf, 16 * 1024) {
            ParseOutcome::Complete(head) => {
                let xa: Vec<_> = head.headers.iter().filter(|(n, _)| n == "X-A").collect();
                assert_eq!(xa.len(), 2);
                assert_eq!(xa[0].1, b"1");
                assert_eq!(xa[1].1, b"2");
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn malformed_start_line_is_rejected() {
        let buf = b"NOT A REQUEST LINE AT ALL\r\n\r\n";
        match parse_request(buf, 16 * 1024) {
            ParseOutcome::Malformed(_) => {}
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn oversize_incomplete_buffer_is_headers_too_large() {
        let buf = vec![b'a'; 100];
        match parse_request(&buf, 64) {
            ParseOutcome::Malformed(ParseError::HeadersTooLarge) => {}
            other => panic!("expected HeadersTooLarge, got {:?}", other),
        }
    }
}
