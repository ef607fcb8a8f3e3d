//! Handler and routed-handler contracts.

use crate::message::{Request, Response};
use crate::router::tree::Capture;

/// A list of `(name, value)` placeholder/wildcard captures, in the order
/// the pattern declared them.
pub type Captures = [Capture];

/// A handler invoked without route captures, e.g. the default 404/405
/// fallbacks.
pub trait Handler: Send + Sync {
    /// Produces a response for `request`, starting from `response`.
    fn handle(&self, request: &mut Request, response: Response) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&mut Request, Response) -> Response + Send + Sync,
{
    fn handle(&self, request: &mut Request, response: Response) -> Response {
        (self)(request, response)
    }
}

/// A handler invoked with the captures bound by a route match.
pub trait RoutedHandler: Send + Sync {
    /// Produces a response for `request`, given the captures bound by the
    /// route that matched it.
    fn handle(&self, request: &mut Request, response: Response, captures: &Captures) -> Response;
}

impl<F> RoutedHandler for F
where
    F: Fn(&mut Request, Response, &Captures) -> Response + Send + Sync,
{
    fn handle(&self, request: &mut Request, response: Response, captures: &Captures) -> Response {
        (self)(request, response, captures)
    }
}
