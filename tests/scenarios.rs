//! End-to-end request-to-response scenarios, driven through the full
//! messenger + router stack via the in-memory test harness.

use gatehouse::{Captures, Chain, Request, Response, Router, StatusCode};
use gatehouse::test_support::TestServer;

fn body_chain(body: &'static [u8]) -> Chain {
    Chain::new(move |_req: &mut Request, mut resp: Response, _caps: &Captures| {
        resp.body_mut().write(body);
        resp
    })
}

#[test]
fn simple_get_is_served_with_keep_alive_and_content_length() {
    let mut router = Router::new();
    router.register("GET", "/hello", body_chain(b"world")).unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Connection: keep-alive\r\n"));
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("world"));
}

#[test]
fn placeholder_capture_reaches_the_handler() {
    let mut router = Router::new();
    router
        .register(
            "GET",
            "/items/:id/owner",
            Chain::new(|_req: &mut Request, mut resp: Response, caps: &Captures| {
                let id = caps.iter().find(|(n, _)| n == "id").map(|(_, v)| v.clone()).unwrap();
                resp.body_mut().write(id.as_bytes());
                resp
            }),
        )
        .unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(b"GET /items/42/owner HTTP/1.1\r\nHost: x\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();
    assert!(text.ends_with("42"));
}

#[test]
fn unregistered_method_on_known_path_is_405_with_allow() {
    let mut router = Router::new();
    router.register("GET", "/p", body_chain(b"x")).unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(b"POST /p HTTP/1.1\r\nHost:x\r\nContent-Length: 5\r\n\r\nhello");
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 405"));
    assert!(text.contains("Allow: OPTIONS, HEAD, GET\r\n"));
}

#[test]
fn options_on_multi_method_path_lists_every_allowed_method() {
    let mut router = Router::new();
    router.register("GET", "/items/:id", body_chain(b"g")).unwrap();
    router.register("DELETE", "/items/:id", body_chain(b"d")).unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(b"OPTIONS /items/42 HTTP/1.1\r\nHost:x\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 204"));
    assert!(text.contains("Allow: OPTIONS, HEAD, GET, DELETE\r\n"));
}

#[test]
fn deep_wildcard_captures_the_remainder_of_the_path() {
    let mut router = Router::new();
    router
        .register(
            "GET",
            "/deep/*",
            Chain::new(|_req: &mut Request, mut resp: Response, caps: &Captures| {
                let value = caps.iter().find(|(n, _)| n == "*").map(|(_, v)| v.clone()).unwrap();
                resp.body_mut().write(value.as_bytes());
                resp
            }),
        )
        .unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(b"GET /deep/a/b/c HTTP/1.1\r\nHost:x\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();
    assert!(text.ends_with("a/b/c"));
}

#[test]
fn negative_content_length_is_rejected_before_dispatch() {
    let router = Router::new();
    let server = TestServer::new(&router);
    let raw = server.send(b"GET / HTTP/1.1\r\nHost:x\r\nContent-Length: -1\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();
    assert!(text.starts_with("HTTP/1.1 400"));
}

#[test]
fn oversize_body_is_rejected_before_any_handler_runs() {
    let mut router = Router::new();
    router.register("POST", "/upload", body_chain(b"unreachable")).unwrap();

    // 17 MiB declared, default 16 MiB ceiling: rejected on the declared
    // Content-Length alone, never reading (let alone buffering) the body.
    let server = TestServer::new(&router);
    let raw = server.send(b"POST /upload HTTP/1.1\r\nHost:x\r\nContent-Length: 17825792\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();
    assert!(text.starts_with("HTTP/1.1 413"));
}

#[test]
fn two_pipelined_requests_on_one_connection_both_dispatch_in_order() {
    let mut router = Router::new();
    router.register("GET", "/a", body_chain(b"A")).unwrap();
    router.register("GET", "/b", body_chain(b"B")).unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(
        b"GET /a HTTP/1.1\r\nHost:x\r\n\r\nGET /b HTTP/1.1\r\nHost:x\r\nConnection: close\r\n\r\n",
    );
    let text = String::from_utf8(raw).unwrap();

    let first = text.find("200 OK").unwrap();
    let second = text[first + 1..].find("200 OK").unwrap();
    assert!(second > 0);
    assert!(text.ends_with('B'));
    assert!(text.contains('A'));
}

#[test]
fn head_mirrors_get_but_drops_the_body() {
    let mut router = Router::new();
    router.register("GET", "/hello", body_chain(b"world")).unwrap();

    let server = TestServer::new(&router);
    let raw = server.send(b"HEAD /hello HTTP/1.1\r\nHost:x\r\nConnection: close\r\n\r\n");
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn status_class_bucket_covers_unregistered_codes() {
    assert_eq!(StatusCode::from_u16(484).unwrap().reason_phrase(), "Client error");
}
