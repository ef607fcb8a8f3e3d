//! The connection state machine: request-parse -> handler-invoke ->
//! response-emit -> keep-alive decision, driven over a [`Transport`].

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, trace, warn};

use crate::body::Body;
use crate::config::Config;
use crate::error::{HandlerError, ParseError, TransportError};
use crate::header::HeaderStore;
use crate::message::{Request, Response};
use crate::parser::{self, ParseOutcome};
use crate::router::Router;
use crate::status::StatusCode;
use crate::transport::{ReadMode, Transport};

/// What a single request/response cycle decided about the connection.
enum Step {
    /// A response was emitted and the connection stays open for another
    /// request.
    KeepGoing,
    /// The connection should close, having already emitted a response (or
    /// an error response).
    Closed,
    /// The connection should close without emitting anything (idle
    /// timeout with no bytes ever read, or peer EOF).
    ClosedSilent,
}

/// Drives one connection's worth of HTTP/1.x traffic over a [`Transport`],
/// dispatching completed requests through a [`Router`].
pub struct Messenger<'a, T: Transport> {
    transport: T,
    config: Config,
    router: &'a Router,
    /// Bytes already read off the transport but not yet consumed by the
    /// request that needed them -- either the start of a pipelined next
    /// request, or (rarely) body bytes read alongside the header chunk.
    pending: Vec<u8>,
}

impl<'a, T: Transport> Messenger<'a, T> {
    /// Builds a messenger over `transport`, dispatching through `router`.
    pub fn new(transport: T, config: Config, router: &'a Router) -> Self {
        Messenger {
            transport,
            config,
            router,
            pending: Vec::new(),
        }
    }

    /// Unwraps the messenger, returning its transport. Used by the test
    /// harness to inspect a [`crate::transport::MemoryTransport`]'s output
    /// after a run completes.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Runs the state machine until the connection closes.
    ///
    /// The transport is released on every exit path, including a
    /// mid-connection I/O error -- `close()` runs before the error (or
    /// success) is returned to the caller.
    pub fn run(&mut self) -> Result<(), TransportError> {
        let result = loop {
            match self.serve_one() {
                Ok(Step::KeepGoing) => continue,
                Ok(Step::Closed) | Ok(Step::ClosedSilent) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.transport.close()?;
        result
    }

    fn serve_one(&mut self) -> Result<Step, TransportError> {
        // AWAIT_REQUEST
        if self.pending.is_empty() && !self.transport.wait_for_data(self.config.header_read_timeout())? {
            return Ok(Step::ClosedSilent);
        }

        // READ_HEADERS
        let (head, after_headers) = match self.read_head()? {
            Ok(parts) => parts,
            Err(step) => return Ok(step),
        };

        // READ_BODY
        let body_bytes = match self.read_body(&head, after_headers)? {
            Ok(bytes) => bytes,
            Err(step) => return Ok(step),
        };

        let mut request = Request::new(head.protocol.clone(), head.method.clone(), head.target.clone());
        for (name, value) in &head.headers {
            request.headers_mut().append(name, value.clone());
        }
        request.set_body(Body::from_bytes(body_bytes));

        // DISPATCH
        let protocol = request.protocol().to_string();
        let router = self.router;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| router.dispatch(&mut request)));
        let (mut response, keep_alive) = match outcome {
            Ok(response) => {
                let keep_alive = wants_keep_alive(request.protocol(), request.headers());
                (response, keep_alive)
            }
            Err(payload) => {
                let handler_error = HandlerError::new(panic_message(&payload));
                error!("{}", handler_error);
                (Response::new(protocol, StatusCode::INTERNAL_SERVER_ERROR), false)
            }
        };

        // EMIT_RESPONSE
        let bytes = serialize_response(&mut response, keep_alive);
        self.transport.write(&bytes)?;
        self.transport.flush()?;

        if keep_alive {
            trace!("response emitted, keeping connection alive");
            Ok(Step::KeepGoing)
        } else {
            trace!("response emitted, closing connection");
            Ok(Step::Closed)
        }
    }

    /// Reads and parses the request head, growing the read chunk size
    /// (doubling on each `NEED_MORE`, starting from
    /// [`Config::initial_header_buffer`]) as needed. On success, returns the
    /// parsed head plus any bytes read alongside it that belong to the body
    /// (or a pipelined next request). `Ok(Err(step))` signals the connection
    /// should terminate (error response already emitted, or silent close).
    ///
    /// `parser::parse_request` re-scans `buffer` from the start on every
    /// call -- `httparse::Request::parse` has no re-entrant state to resume
    /// from, so true O(new-bytes) incremental re-parsing is not available
    /// through it. What this loop does implement is the buffer-growth
    /// policy: each retry reads a geometrically larger chunk rather than a
    /// fixed one, so a slow-trickling header section doesn't cost O(n)
    /// transport round-trips.
    #[allow(clippy::type_complexity)]
    fn read_head(&mut self) -> Result<Result<(parser::ParsedHead, Vec<u8>), Step>, TransportError> {
        let mut buffer: Vec<u8> = std::mem::take(&mut self.pending);
        let mut read_size = self.config.initial_header_buffer().max(512);
        loop {
            match parser::parse_request(&buffer, self.config.max_header_bytes()) {
                ParseOutcome::NeedMore => {}
                ParseOutcome::Complete(head) => {
                    let headers_end = head.headers_end;
                    let after_headers = buffer[headers_end..].to_vec();
                    return Ok(Ok((head, after_headers)));
                }
                ParseOutcome::Malformed(e) => {
                    warn!("malformed request head: {}", e);
                    return Ok(Err(self.emit_error(e.status())?));
                }
            }

            if !self.transport.wait_for_data(self.config.header_read_timeout())? {
                return Ok(Err(self.emit_error(StatusCode::REQUEST_TIMEOUT)?));
            }
            let mut chunk = vec![0u8; read_size];
            let n = self.transport.read(&mut chunk, ReadMode::Once)?;
            if n == 0 {
                if buffer.is_empty() {
                    return Ok(Err(Step::ClosedSilent));
                }
                return Ok(Err(self.emit_error(StatusCode::BAD_REQUEST)?));
            }
            buffer.extend_from_slice(&chunk[..n]);
            read_size = (read_size * 2).min(self.config.max_header_bytes());
        }
    }

    /// Determines the declared body length from the parsed headers and
    /// assembles exactly that many bytes, starting from `already_read`
    /// (body bytes the header read happened to pick up) and reading the
    /// rest off the transport. Any surplus beyond the declared length is
    /// stashed in `self.pending` for the next pipelined request.
    #[allow(clippy::type_complexity)]
    fn read_body(&mut self, head: &parser::ParsedHead, already_read: Vec<u8>) -> Result<Result<Vec<u8>, Step>, TransportError> {
        let content_lengths: Vec<&[u8]> = head
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.as_slice())
            .collect();
        let has_transfer_encoding = head.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("transfer-encoding"));

        let body_len: usize = if content_lengths.len() > 1 {
            warn!("conflicting Content-Length headers");
            return Ok(Err(self.emit_error(ParseError::ConflictingContentLength.status())?));
        } else if let Some(raw) = content_lengths.first() {
            match std::str::from_utf8(raw).ok().and_then(|s| s.parse::<i64>().ok()) {
                Some(n) if n >= 0 => n as usize,
                _ => {
                    warn!("invalid Content-Length");
                    return Ok(Err(self.emit_error(ParseError::InvalidContentLength.status())?));
                }
            }
        } else if has_transfer_encoding {
            warn!("unsupported transfer-encoding");
            return Ok(Err(self.emit_error(ParseError::UnsupportedTransferEncoding.status())?));
        } else {
            0
        };

        if body_len > self.config.max_body_bytes() {
            warn!("body declared at {} bytes exceeds limit", body_len);
            return Ok(Err(self.emit_error(ParseError::BodyTooLarge.status())?));
        }

        let mut body = already_read;
        if body.len() > body_len {
            self.pending = body.split_off(body_len);
        }
        while body.len() < body_len {
            if !self.transport.wait_for_data(self.config.body_read_timeout())? {
                return Ok(Err(self.emit_error(StatusCode::REQUEST_TIMEOUT)?));
            }
            let remaining = body_len - body.len();
            let mut chunk = vec![0u8; remaining];
            let n = self.transport.read(&mut chunk, ReadMode::Once)?;
            if n == 0 {
                return Ok(Err(Step::ClosedSilent));
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok(Ok(body))
    }

    fn emit_error(&mut self, status: StatusCode) -> Result<Step, TransportError> {
        debug!("emitting error response {}", status);
        let line = format!("HTTP/1.1 {} {}\r\n\r\n", status.as_u16(), status.reason_phrase());
        self.transport.write(line.as_bytes())?;
        self.transport.flush()?;
        Ok(Step::Closed)
    }
}

fn wants_keep_alive(protocol: &str, headers: &HeaderStore) -> bool {
    let connection = headers.get_str("Connection").map(|v| v.to_ascii_lowercase());
    match protocol {
        "HTTP/1.1" => connection.as_deref() != Some("close"),
        "HTTP/1.0" => connection.as_deref() == Some("keep-alive"),
        _ => false,
    }
}

fn serialize_response(response: &mut Response, keep_alive: bool) -> Vec<u8> {
    let body_len = response.body().total_len();
    response
        .headers_mut()
        .set("Content-Length", vec![body_len.to_string().into_bytes()]);
    response.headers_mut().set(
        "Connection",
        vec![if keep_alive { b"keep-alive".to_vec() } else { b"close".to_vec() }],
    );

    let mut out = Vec::new();
    out.extend_from_slice(
        format!(
            "{} {} {}\r\n",
            response.protocol(),
            response.status().as_u16(),
            response.reason_phrase()
        )
        .as_bytes(),
    );
    for (name, values) in response.headers().iter() {
        for value in values {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&response.body().to_bytes());
    out
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Captures;
    use crate::middleware::Chain;
    use crate::transport::MemoryTransport;

    fn router_with_hello() -> Router {
        let mut router = Router::new();
        router
            .register(
                "GET",
                "/hello",
                Chain::new(|_req: &mut Request, mut resp: Response, _caps: &Captures| {
                    resp.body_mut().write(b"hi");
                    resp
                }),
            )
            .unwrap();
        router
    }

    #[test]
    fn serves_single_request_then_closes_on_connection_close() {
        let _ = env_logger::builder().is_test(true).try_init();

        let router = router_with_hello();
        let mut transport = MemoryTransport::new();
        transport.feed(b"GET /hello HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n");
        let mut messenger = Messenger::new(transport, Config::new(), &router);
        messenger.run().unwrap();

        let out = String::from_utf8(messenger.transport.output.clone()).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("Connection: close\r\n"));
        assert!(out.ends_with("hi"));
    }

    #[test]
    fn pipelined_keep_alive_requests_both_dispatch() {
        let router = router_with_hello();
        let mut transport = MemoryTransport::new();
        transport.feed(b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n");
        transport.feed(b"GET /hello HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n");
        let mut messenger = Messenger::new(transport, Config::new(), &router);
        messenger.run().unwrap();

        let out = String::from_utf8(messenger.transport.output.clone()).unwrap();
        assert_eq!(out.matches("200 OK").count(), 2);
    }

    #[test]
    fn negative_content_length_is_bad_request() {
        let router = router_with_hello();
        let mut transport = MemoryTransport::new();
        transport.feed(b"GET / HTTP/1.1\r\nHost: x\r\nContent-Length: -1\r\n\r\n");
        let mut messenger = Messenger::new(transport, Config::new(), &router);
        messenger.run().unwrap();

        let out = String::from_utf8(messenger.transport.output.clone()).unwrap();
        assert!(out.starts_with("HTTP/1.1 400 Bad Request"));
    }

    /// A transport whose `read` always fails after the first `wait_for_data`,
    /// used to confirm `run()` releases the transport on an I/O error path.
    struct ErroringTransport {
        inner: MemoryTransport,
        closed: bool,
    }

    impl Transport for ErroringTransport {
        fn wait_for_data(&mut self, timeout: std::time::Duration) -> Result<bool, TransportError> {
            self.inner.wait_for_data(timeout)
        }

        fn read(&mut self, _buf: &mut [u8], _mode: ReadMode) -> Result<usize, TransportError> {
            Err(TransportError::Closed)
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.inner.write(bytes)
        }

        fn flush(&mut self) -> Result<(), TransportError> {
            self.inner.flush()
        }

        fn close(&mut self) -> Result<(), TransportError> {
            self.closed = true;
            self.inner.close()
        }

        fn is_empty(&mut self) -> Result<bool, TransportError> {
            self.inner.is_empty()
        }
    }

    #[test]
    fn run_releases_transport_even_when_a_read_errors() {
        let router = router_with_hello();
        let mut inner = MemoryTransport::new();
        inner.feed(b"GET /hello HTTP/1.1\r\n");
        let transport = ErroringTransport { inner, closed: false };
        let mut messenger = Messenger::new(transport, Config::new(), &router);

        assert!(messenger.run().is_err());
        assert!(messenger.transport.closed);
    }

    #[test]
    fn oversize_body_is_rejected_before_dispatch() {
        let router = router_with_hello();
        let mut config = Config::new();
        config.set_max_body_bytes(10);
        let mut transport = MemoryTransport::new();
        transport.feed(b"POST /hello HTTP/1.1\r\nHost: x\r\nContent-Length: 20\r\n\r\n");
        let mut messenger = Messenger::new(transport, config, &router);
        messenger.run().unwrap();

        let out = String::from_utf8(messenger.transport.output.clone()).unwrap();
        assert!(out.starts_with("HTTP/1.1 413"));
    }
}
