//! Five per-method route trees plus a shared methods-index tree, wired
//! together into request dispatch.

pub mod tree;

use log::{info, trace};

use crate::error::RegistrationError;
use crate::handler::Handler;
use crate::message::{Request, Response};
use crate::middleware::Chain;
use crate::status::StatusCode;
use tree::Tree;

fn allowed_methods_for(entry: &mut Vec<String>, method: &str) {
    if entry.is_empty() {
        entry.push("OPTIONS".to_string());
    }
    if method == "GET" && !entry.iter().any(|m| m == "HEAD") {
        entry.insert(1, "HEAD".to_string());
    }
    if !entry.iter().any(|m| m == method) {
        entry.push(method.to_string());
    }
}

/// Binds URL patterns to middleware chains across the five mutating HTTP
/// methods, and computes `OPTIONS`/`HEAD`/`405` behaviour from the
/// combined registration set.
pub struct Router {
    get: Tree<Chain>,
    post: Tree<Chain>,
    put: Tree<Chain>,
    patch: Tree<Chain>,
    delete: Tree<Chain>,
    methods_index: Tree<Vec<String>>,
    not_found: Box<dyn Handler>,
    method_not_allowed: Box<dyn Handler>,
}

impl Default for Router {
    fn default() -> Self {
        Router {
            get: Tree::new(),
            post: Tree::new(),
            put: Tree::new(),
            patch: Tree::new(),
            delete: Tree::new(),
            methods_index: Tree::new(),
            not_found: Box::new(|_req: &mut Request, mut resp: Response| {
                resp.set_status(StatusCode::NOT_FOUND);
                resp
            }),
            method_not_allowed: Box::new(|_req: &mut Request, mut resp: Response| {
                resp.set_status(StatusCode::METHOD_NOT_ALLOWED);
                resp
            }),
        }
    }
}

impl Router {
    /// A router with the default 404/405 fallbacks.
    pub fn new() -> Self {
        Router::default()
    }

    /// Overrides the handler invoked when no route matches.
    pub fn set_not_found(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.not_found = Box::new(handler);
        self
    }

    /// Overrides the handler invoked for `405 Method Not Allowed`. The
    /// `Allow` header is always set by the router itself before this runs.
    pub fn set_method_not_allowed(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.method_not_allowed = Box::new(handler);
        self
    }

    fn tree_for_mut(&mut self, method: &str) -> Option<&mut Tree<Chain>> {
        match method {
            "GET" => Some(&mut self.get),
            "POST" => Some(&mut self.post),
            "PUT" => Some(&mut self.put),
            "PATCH" => Some(&mut self.patch),
            "DELETE" => Some(&mut self.delete),
            _ => None,
        }
    }

    fn tree_for(&self, method: &str) -> Option<&Tree<Chain>> {
        match method {
            "GET" => Some(&self.get),
            "POST" => Some(&self.post),
            "PUT" => Some(&self.put),
            "PATCH" => Some(&self.patch),
            "DELETE" => Some(&self.delete),
            _ => None,
        }
    }

    /// Registers `chain` at `pattern` for `method`, one of
    /// `GET`/`POST`/`PUT`/`PATCH`/`DELETE`.
    pub fn register(&mut self, method: &str, pattern: &str, chain: Chain) -> Result<(), RegistrationError> {
        let tree = self
            .tree_for_mut(method)
            .unwrap_or_else(|| panic!("unsupported registration method `{}`", method));
        tree.insert(pattern, chain)?;
        info!("registered {} {}", method, pattern);

        let method = method.to_string();
        self.methods_index.upsert(
            pattern,
            {
                let method = method.clone();
                move || {
                    let mut fresh = Vec::new();
                    allowed_methods_for(&mut fresh, &method);
                    fresh
                }
            },
            move |existing| allowed_methods_for(existing, &method),
        )
    }

    /// Routes `request` to its handler, or to the appropriate 404/405/204
    /// fallback.
    pub fn dispatch(&self, request: &mut Request) -> Response {
        let path = request.path().to_string();
        let method = request.method().to_string();
        let protocol = request.protocol().to_string();

        trace!("dispatch {} {}", method, path);

        if method.len() < 3 {
            return self.not_found.handle(request, Response::new(protocol, StatusCode::NOT_FOUND));
        }

        match method.as_str() {
            "GET" | "POST" | "PUT" | "PATCH" | "DELETE" => {
                let tree = self.tree_for(&method).expect("method validated above");
                match tree.matches(&path) {
                    Some((chain, captures)) => {
                        let response = Response::new(protocol, StatusCode::OK);
                        chain.invoke(request, response, &captures)
                    }
                    None => self.fallback(request, &path, &protocol),
                }
            }
            "HEAD" => match self.get.matches(&path) {
                Some((chain, captures)) => {
                    let response = Response::new(protocol, StatusCode::OK);
                    let mut response = chain.invoke(request, response, &captures);
                    let content_length = response.body().total_len();
                    response.set_body(crate::body::Body::empty());
                    response
                        .headers_mut()
                        .set("Content-Length", vec![content_length.to_string().into_bytes()]);
                    response
                }
                None => self.fallback(request, &path, &protocol),
            },
            "OPTIONS" => match self.methods_index.matches(&path) {
                Some((allowed, _)) => {
                    let mut response = Response::new(protocol, StatusCode::NO_CONTENT);
                    response.headers_mut().set("Allow", vec![allowed.join(", ").into_bytes()]);
                    response
                }
                None => self.not_found.handle(request, Response::new(protocol, StatusCode::NOT_FOUND)),
            },
            _ => self.fallback(request, &path, &protocol),
        }
    }

    fn fallback(&self, request: &mut Request, path: &str, protocol: &str) -> Response {
        match self.methods_index.matches(path) {
            Some((allowed, _)) => {
                let mut response = self
                    .method_not_allowed
                    .handle(request, Response::new(protocol, StatusCode::METHOD_NOT_ALLOWED));
                response.headers_mut().set("Allow", vec![allowed.join(", ").into_bytes()]);
                response
            }
            None => self.not_found.handle(request, Response::new(protocol, StatusCode::NOT_FOUND)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Captures;

    fn text_chain(body: &'static str) -> Chain {
        Chain::new(move |_req: &mut Request, mut resp: Response, _caps: &Captures| {
            resp.body_mut().write(body.as_bytes());
            resp
        })
    }

    #[test]
    fn options_allow_header_orders_head_right_after_options() {
        let mut router = Router::new();
        router.register("GET", "/p", text_chain("x")).unwrap();

        let mut req = Request::new("HTTP/1.1", "OPTIONS", "/p");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers().get_str("Allow"), Some("OPTIONS, HEAD, GET"));
    }

    #[test]
    fn options_allow_header_includes_every_registered_method() {
        let mut router = Router::new();
        router.register("GET", "/items/:id", text_chain("g")).unwrap();
        router.register("DELETE", "/items/:id", text_chain("d")).unwrap();

        let mut req = Request::new("HTTP/1.1", "OPTIONS", "/items/42");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers().get_str("Allow"), Some("OPTIONS, HEAD, GET, DELETE"));
    }

    #[test]
    fn unregistered_method_on_registered_path_is_405() {
        let mut router = Router::new();
        router.register("GET", "/p", text_chain("x")).unwrap();

        let mut req = Request::new("HTTP/1.1", "POST", "/p");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get_str("Allow"), Some("OPTIONS, HEAD, GET"));
    }

    #[test]
    fn head_mirrors_get_headers_with_empty_body() {
        let mut router = Router::new();
        router.register("GET", "/p", text_chain("hello")).unwrap();

        let mut req = Request::new("HTTP/1.1", "HEAD", "/p");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.body().is_empty());
        assert_eq!(resp.headers().get_str("Content-Length"), Some("5"));
    }

    #[test]
    fn unregistered_path_is_404() {
        let router = Router::new();
        let mut req = Request::new("HTTP/1.1", "GET", "/nope");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn short_method_token_is_rejected_as_404() {
        let router = Router::new();
        let mut req = Request::new("HTTP/1.1", "GE", "/p");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn deep_wildcard_dispatch_binds_capture() {
        let mut router = Router::new();
        router
            .register(
                "GET",
                "/deep/*",
                Chain::new(|_req: &mut Request, mut resp: Response, caps: &Captures| {
                    let value = caps.iter().find(|(n, _)| n == "*").map(|(_, v)| v.clone()).unwrap_or_default();
                    resp.body_mut().write(value.as_bytes());
                    resp
                }),
            )
            .unwrap();

        let mut req = Request::new("HTTP/1.1", "GET", "/deep/a/b/c");
        let resp = router.dispatch(&mut req);
        assert_eq!(resp.body().to_bytes().as_ref(), b"a/b/c");
    }
}
