//! Request and response records.

use crate::attributes::Attributes;
use crate::body::Body;
use crate::header::HeaderStore;
use crate::status::StatusCode;

/// A parsed HTTP/1.x request, ready for routing and dispatch.
#[derive(Debug)]
pub struct Request {
    protocol: String,
    method: String,
    target: String,
    headers: HeaderStore,
    body: Body,
    attributes: Attributes,
}

impl Request {
    /// Builds a request from its wire-level parts. `method` is stored
    /// exactly as received; route matching compares it case-sensitively
    /// against the tree it was registered under.
    pub fn new(protocol: impl Into<String>, method: impl Into<String>, target: impl Into<String>) -> Self {
        Request {
            protocol: protocol.into(),
            method: method.into(),
            target: target.into(),
            headers: HeaderStore::new(),
            body: Body::empty(),
            attributes: Attributes::new(),
        }
    }

    /// The request-line protocol token, e.g. `"HTTP/1.1"`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The request method, e.g. `"GET"`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request-line target, e.g. `"/users/42?verbose=1"`.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path portion of `target`, with any `?query` stripped.
    pub fn path(&self) -> &str {
        match self.target.find('?') {
            Some(i) => &self.target[..i],
            None => &self.target,
        }
    }

    /// The raw query string, if any, excluding the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.target.find('?').map(|i| &self.target[i + 1..])
    }

    /// Sets the protocol token.
    pub fn set_protocol(&mut self, protocol: impl Into<String>) -> &mut Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the target.
    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.target = target.into();
        self
    }

    /// Borrows the header store.
    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    /// Mutably borrows the header store.
    pub fn headers_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }

    /// Borrows the body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Mutably borrows the body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Replaces the body outright.
    pub fn set_body(&mut self, body: Body) -> &mut Self {
        self.body = body;
        self
    }

    /// Borrows the request's attribute map.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutably borrows the request's attribute map. Middleware and route
    /// captures are stored here.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

/// An HTTP/1.x response, ready for emission onto the wire.
#[derive(Debug)]
pub struct Response {
    protocol: String,
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderStore,
    body: Body,
}

impl Response {
    /// A new response with the given status and the connection's protocol
    /// token, no headers, and an empty body.
    pub fn new(protocol: impl Into<String>, status: StatusCode) -> Self {
        Response {
            protocol: protocol.into(),
            status,
            reason: None,
            headers: HeaderStore::new(),
            body: Body::empty(),
        }
    }

    /// The protocol token to emit on the status line.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The response's status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// The reason phrase to emit: a caller override if one was set via
    /// [`Response::set_reason`], otherwise the status code's default.
    pub fn reason_phrase(&self) -> &str {
        match &self.reason {
            Some(r) => r,
            None => self.status.reason_phrase(),
        }
    }

    /// Overrides the reason phrase. Pass `None` to fall back to the status
    /// code's default.
    pub fn set_reason(&mut self, reason: Option<String>) -> &mut Self {
        self.reason = reason;
        self
    }

    /// Borrows the header store.
    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    /// Mutably borrows the header store.
    pub fn headers_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }

    /// Borrows the body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Mutably borrows the body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Replaces the body outright.
    pub fn set_body(&mut self, body: Body) -> &mut Self {
        self.body = body;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_query_split_on_first_question_mark() {
        let req = Request::new("HTTP/1.1", "GET", "/a/b?x=1&y=2");
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.query(), Some("x=1&y=2"));
    }

    #[test]
    fn target_without_query_has_no_query() {
        let req = Request::new("HTTP/1.1", "GET", "/a/b");
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.query(), None);
    }

    #[test]
    fn reason_override_falls_back_to_default() {
        let mut resp = Response::new("HTTP/1.1", StatusCode::NOT_FOUND);
        assert_eq!(resp.reason_phrase(), "Not Found");
        resp.set_reason(Some("Nope".to_string()));
        assert_eq!(resp.reason_phrase(), "Nope");
        resp.set_reason(None);
        assert_eq!(resp.reason_phrase(), "Not Found");
    }
}
