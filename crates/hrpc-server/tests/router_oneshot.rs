#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hrpc_core::codec;
use hrpc_server::app_state::AppState;
use hrpc_server::config::ServerConfig;
use hrpc_server::router::build_router;
use hrpc_core::method::Method;
use hrpc_core::protocol::envelope::Metadata;
use hrpc_core::status::Status;
use hrpc_server::dispatch::handler_fn;
use hrpc_server::services::greeter::{HelloRequest, HelloResponse};

const SLOW: Method<HelloRequest, HelloResponse> = Method::new("lab", "slow");

async fn slow_hello(req: HelloRequest, _md: Metadata) -> Result<HelloResponse, Status> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Ok(HelloResponse { text: req.name })
}

fn state_with(mutate: impl FnOnce(&mut ServerConfig)) -> AppState {
    let mut cfg = ServerConfig::default();
    mutate(&mut cfg);
    cfg.validate().unwrap();
    AppState::new(cfg).unwrap()
}

fn app(state: &AppState) -> Router {
    build_router(state.clone())
}

fn hello(name: &str) -> Bytes {
    codec::encode(&HelloRequest { name: name.into() }).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Option<String>, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let grpc = resp
        .headers()
        .get("grpc-status")
        .map(|v| v.to_str().unwrap().to_string());
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, grpc, body)
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/octet-stream")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn path_embedded_procedure() {
    let state = state_with(|_| {});
    let (status, grpc, body) = send(app(&state), post("/greeter/say-hello", hello("world"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(grpc.as_deref(), Some("0"));
    let out: HelloResponse = codec::decode(body).unwrap();
    assert_eq!(out.text, "Hello world");
}

#[tokio::test]
async fn procedure_from_rpc_name_header() {
    let state = state_with(|_| {});
    let req = Request::post("/greeter")
        .header("rpc-name", "say-bye")
        .body(Body::from(hello("moon")))
        .unwrap();
    let (status, grpc, body) = send(app(&state), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(grpc.as_deref(), Some("0"));
    let out: HelloResponse = codec::decode(body).unwrap();
    assert_eq!(out.text, "Bye moon");
}

#[tokio::test]
async fn bare_service_path_uses_default_procedure() {
    let state = state_with(|_| {});
    let (status, grpc, body) = send(app(&state), post("/greeter", hello("plain"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grpc.as_deref(), Some("0"));
    let out: HelloResponse = codec::decode(body).unwrap();
    assert_eq!(out.text, "Hello plain");
}

#[tokio::test]
async fn missing_procedure_without_default_is_unimplemented() {
    let state = AppState::with_registry(ServerConfig::default(), |d| {
        d.register(SLOW, handler_fn(slow_hello));
        Ok(())
    })
    .unwrap();
    let (status, grpc, body) = send(app(&state), post("/lab", hello("x"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grpc.as_deref(), Some("12"));
    assert_eq!(body, Bytes::from_static(b"unknown RPC name: missing rpc-name header"));
}

#[tokio::test]
async fn cancelled_request_leaves_in_flight_gauge_at_zero() {
    let state = AppState::with_registry(ServerConfig::default(), |d| {
        d.register(SLOW, handler_fn(slow_hello));
        Ok(())
    })
    .unwrap();

    let pending = app(&state).oneshot(post("/lab/slow", hello("late")));
    let timed_out = tokio::time::timeout(Duration::from_millis(100), pending).await;
    assert!(timed_out.is_err());

    assert_eq!(state.metrics().requests_in_flight.get(&[]), 0);
}

#[tokio::test]
async fn unknown_procedure_is_unimplemented_with_text_body() {
    let state = state_with(|_| {});
    let req = post("/greeter/say-nothing", hello("x"));
    let resp = app(&state).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("grpc-status").unwrap(), "12");
    assert_eq!(resp.headers().get("content-type").unwrap(), "text/plain; charset=utf-8");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body, Bytes::from_static(b"unknown RPC name: say-nothing"));
}

#[tokio::test]
async fn malformed_payload_is_invalid_argument() {
    let state = state_with(|_| {});
    let (_, grpc, _) = send(app(&state), post("/greeter/say-hello", vec![0x0a_u8, 0xff])).await;
    assert_eq!(grpc.as_deref(), Some("3"));

    let metrics = state.metrics();
    assert_eq!(metrics.decode_errors.get(&[("procedure", "greeter/say-hello")]), 1);
}

#[tokio::test]
async fn base64_transfer_encoding_is_decoded() {
    let state = state_with(|_| {});
    let text = codec::encode_base64(&hello("b64"));
    let req = Request::post("/greeter/say-hello")
        .header("content-transfer-encoding", "base64")
        .body(Body::from(text))
        .unwrap();
    let (_, grpc, body) = send(app(&state), req).await;
    assert_eq!(grpc.as_deref(), Some("0"));
    let out: HelloResponse = codec::decode(body).unwrap();
    assert_eq!(out.text, "Hello b64");

    let req = Request::post("/greeter/say-hello")
        .header("content-transfer-encoding", "base64")
        .body(Body::from("***"))
        .unwrap();
    let (_, grpc, _) = send(app(&state), req).await;
    assert_eq!(grpc.as_deref(), Some("3"));
}

#[tokio::test]
async fn base_path_prefixes_rpc_routes_only() {
    let state = state_with(|c| c.server.base_path = "/api/".into());

    let (_, grpc, _) = send(app(&state), post("/api/greeter/say-hello", hello("x"))).await;
    assert_eq!(grpc.as_deref(), Some("0"));

    let (status, _, _) = send(app(&state), post("/greeter/say-hello", hello("x"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = Request::get("/healthz").body(Body::empty()).unwrap();
    let (status, _, _) = send(app(&state), req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let state = state_with(|c| c.server.max_body_bytes = 1024);
    let (status, grpc, _) = send(app(&state), post("/greeter/say-hello", vec![0_u8; 4096])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(grpc, None);
}

#[tokio::test]
async fn ops_endpoints_follow_draining() {
    let state = state_with(|_| {});

    let req = Request::get("/readyz").body(Body::empty()).unwrap();
    let (status, _, _) = send(app(&state), req).await;
    assert_eq!(status, StatusCode::OK);

    send(app(&state), post("/greeter/say-hello", hello("m"))).await;
    state.set_draining();

    let req = Request::get("/readyz").body(Body::empty()).unwrap();
    let (status, _, body) = send(app(&state), req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, Bytes::from_static(b"draining"));

    let req = Request::get("/metrics").body(Body::empty()).unwrap();
    let (_, _, body) = send(app(&state), req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("hrpc_requests_total{code=\"OK\",procedure=\"greeter/say-hello\"} 1"));
    assert!(text.contains("hrpc_draining 1"));
    assert!(text.contains("hrpc_registered_procedures 8"));
}
