//! The per-route middleware chain: an ordered sequence of interceptors
//! wrapping a terminal [`RoutedHandler`].

use crate::handler::{Captures, RoutedHandler};
use crate::message::{Request, Response};

/// A single interceptor in a [`Chain`].
///
/// A middleware may short-circuit by returning without calling `next`,
/// mutate `request`'s attributes before calling `next`, or post-process the
/// response `next` returns.
pub trait Middleware: Send + Sync {
    /// Runs this middleware. Call `next.run(request, response)` to continue
    /// the chain, or return directly to short-circuit it.
    fn call(&self, request: &mut Request, response: Response, next: Next<'_>, captures: &Captures) -> Response;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, Response, Next<'_>, &Captures) -> Response + Send + Sync,
{
    fn call(&self, request: &mut Request, response: Response, next: Next<'_>, captures: &Captures) -> Response {
        (self)(request, response, next, captures)
    }
}

/// A single-use cursor pointing at the remainder of a [`Chain`].
///
/// Calling [`Next::run`] advances the cursor by one position: at a
/// non-final position it invokes the next middleware (passing it a fresh
/// cursor for the position after that); at the final position it invokes
/// the chain's terminal handler.
pub struct Next<'a> {
    middlewares: &'a [Box<dyn Middleware>],
    terminal: &'a dyn RoutedHandler,
    captures: &'a Captures,
}

impl<'a> Next<'a> {
    /// Advances the cursor, invoking whatever sits at this position.
    pub fn run(self, request: &mut Request, response: Response) -> Response {
        match self.middlewares.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    middlewares: rest,
                    terminal: self.terminal,
                    captures: self.captures,
                };
                head.call(request, response, next, self.captures)
            }
            None => self.terminal.handle(request, response, self.captures),
        }
    }
}

/// An ordered middleware chain wrapping a terminal handler.
pub struct Chain {
    middlewares: Vec<Box<dyn Middleware>>,
    terminal: Box<dyn RoutedHandler>,
}

impl Chain {
    /// A chain with no interceptors, running straight to `terminal`.
    pub fn new(terminal: impl RoutedHandler + 'static) -> Self {
        Chain {
            middlewares: Vec::new(),
            terminal: Box::new(terminal),
        }
    }

    /// Appends `middleware` to the end of the chain (closest to the
    /// terminal handler of those already present).
    pub fn push(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Runs the full chain against `request`/`response` with the given
    /// route captures.
    pub fn invoke(&self, request: &mut Request, response: Response, captures: &Captures) -> Response {
        let next = Next {
            middlewares: &self.middlewares,
            terminal: self.terminal.as_ref(),
            captures,
        };
        next.run(request, response)
    }
}
