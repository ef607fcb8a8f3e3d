//! An in-process test harness that drives a request through the full
//! router and messenger stack over an in-memory transport: no real socket
//! is ever opened.

use crate::config::Config;
use crate::messenger::Messenger;
use crate::router::Router;
use crate::transport::MemoryTransport;

/// Drives a [`Router`] through a [`Messenger`] over an in-memory transport,
/// without touching any real socket.
pub struct TestServer<'a> {
    router: &'a Router,
    config: Config,
}

impl<'a> TestServer<'a> {
    /// A test server with the default [`Config`].
    pub fn new(router: &'a Router) -> Self {
        TestServer {
            router,
            config: Config::new(),
        }
    }

    /// A test server with an overridden configuration, e.g. to exercise
    /// size limits with small values.
    pub fn with_config(router: &'a Router, config: Config) -> Self {
        TestServer { router, config }
    }

    /// Feeds `raw_request` (one or more pipelined requests) through a fresh
    /// connection and returns every byte written back.
    pub fn send(&self, raw_request: &[u8]) -> Vec<u8> {
        let mut transport = MemoryTransport::new();
        transport.feed(raw_request);
        let mut messenger = Messenger::new(transport, self.config, self.router);
        messenger.run().expect("in-memory transport never fails");
        messenger.into_transport().output
    }

    /// Sends a minimal `GET` request with no body, closing the connection
    /// immediately afterward, and returns the raw response bytes.
    pub fn get(&self, target: &str) -> Vec<u8> {
        let raw = format!("GET {} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n", target);
        self.send(raw.as_bytes())
    }
}
