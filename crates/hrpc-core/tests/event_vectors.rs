//! Serverless event vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use hrpc_core::protocol::cookie;
use hrpc_core::protocol::event::ServerlessEvent;
use hrpc_core::protocol::headers::split_header_value;

mod vector_loader;

#[test]
fn event_vectors() {
    let files = [
        "event_rpc_post.json",
        "event_minimal.json",
        "event_headers_and_cookies.json",
        "event_bad_base64.json",
    ];

    for f in files {
        let v = vector_loader::load(f);
        let event = ServerlessEvent::from_json(&v.event.to_string()).expect("event must parse");
        let body = event.body_bytes();

        if let Some(err) = v.expect_error {
            let e = body.expect_err("expected error");
            assert_eq!(e.kind(), err.kind, "vector={}", v.description);
            continue;
        }

        let ex = v.expect.expect("missing expect block");
        assert_eq!(event.uri(), ex.uri, "vector={}", v.description);
        assert_eq!(event.method(), ex.method, "vector={}", v.description);
        assert_eq!(body.unwrap().to_vec(), ex.body.decode(), "vector={}", v.description);

        for (name, values) in &ex.headers {
            let raw = event.headers.get(name).expect("header missing from event");
            let split: Vec<String> = split_header_value(name, raw).into_iter().map(String::from).collect();
            assert_eq!(&split, values, "vector={} header={}", v.description, name);
        }

        let cookies = cookie::parse_all(&event.cookies);
        assert_eq!(cookie::request_header(&cookies), ex.cookie_header, "vector={}", v.description);
    }
}

#[test]
fn garbage_json_is_bad_request() {
    let err = ServerlessEvent::from_json("{not json").unwrap_err();
    assert_eq!(err.kind(), "BAD_REQUEST");
}

#[test]
fn unknown_fields_are_tolerated() {
    let line = r#"{"version":"2.0","routeKey":"$default","rawPath":"/x","requestContext":{"http":{"method":"PUT","sourceIp":"1.2.3.4"}}}"#;
    let event = ServerlessEvent::from_json(line).unwrap();
    assert_eq!(event.uri(), "/x");
    assert_eq!(event.method(), "PUT");
}
