//! A hand-rolled HTTP/1.x connection messenger, compressed-trie URL
//! router, and middleware chain.
//!
//! The crate owns exactly three tightly-coupled subsystems: wire parsing
//! and connection state ([`messenger`], [`parser`]), URL routing
//! ([`router`]), and per-route middleware ([`middleware`]). It does not
//! own the TCP listener lifecycle, TLS, sessions, or body codecs --
//! [`transport::Transport`] is the seam applications fill in.

#[macro_use]
extern crate log;

pub mod attributes;
pub mod body;
pub mod config;
pub mod error;
pub mod handler;
pub mod header;
pub mod message;
pub mod messenger;
pub mod middleware;
pub mod parser;
pub mod router;
pub mod status;
pub mod test_support;
pub mod transport;

pub use attributes::Attributes;
pub use body::Body;
pub use config::Config;
pub use error::{HandlerError, ParseError, RegistrationError, TransportError};
pub use handler::{Captures, Handler, RoutedHandler};
pub use header::HeaderStore;
pub use message::{Request, Response};
pub use messenger::Messenger;
pub use middleware::{Chain, Middleware, Next};
pub use router::Router;
pub use status::StatusCode;
pub use transport::{MemoryTransport, ReadMode, TcpTransport, Transport};
