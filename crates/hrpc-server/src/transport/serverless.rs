//! Serverless transport: one JSON event in, one JSON response out.
//!
//! The event is rebuilt into a real `http::Request`, run in-process through
//! the same router the HTTP listener serves, and the resulting response is
//! flattened back into the JSON document the platform expects.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderName, HeaderValue, Method, Request, Uri};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tower::ServiceExt;

use hrpc_core::error::{Error, Result};
use hrpc_core::protocol::cookie::{self, Cookie};
use hrpc_core::protocol::envelope::CONTENT_TYPE_TEXT;
use hrpc_core::protocol::event::{ServerlessEvent, ServerlessResponse};
use hrpc_core::protocol::headers::split_header_value;

/// Cookies parsed from the event, attached to the rebuilt request.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(pub Vec<Cookie>);

/// Rebuild the HTTP request described by `event`.
///
/// Invalid header names or values are skipped with a warning; an invalid
/// body, method or URI fails the whole request.
pub fn reconstruct(event: &ServerlessEvent) -> Result<Request<Body>> {
    let body = event.body_bytes()?;
    let method = Method::from_bytes(event.method().as_bytes())
        .map_err(|e| Error::BadRequest(format!("invalid method {:?}: {e}", event.method())))?;
    let uri: Uri = event
        .uri()
        .parse()
        .map_err(|e| Error::BadRequest(format!("invalid url {:?}: {e}", event.uri())))?;

    let mut req = Request::new(Body::from(body));
    *req.method_mut() = method;
    *req.uri_mut() = uri;

    let headers = req.headers_mut();
    for (name, value) in &event.headers {
        let header_name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(header = %name, error = %e, "skipping invalid header name");
                continue;
            }
        };
        for piece in split_header_value(name, value) {
            match HeaderValue::from_str(piece) {
                Ok(v) => {
                    headers.append(header_name.clone(), v);
                }
                Err(e) => tracing::warn!(header = %name, error = %e, "skipping invalid header value"),
            }
        }
    }

    let cookies = cookie::parse_all(&event.cookies);
    if let Some(pairs) = cookie::request_header(&cookies) {
        let merged = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{existing}; {pairs}"),
            _ => pairs,
        };
        match HeaderValue::from_str(&merged) {
            Ok(v) => {
                headers.insert(COOKIE, v);
            }
            Err(e) => tracing::warn!(error = %e, "skipping invalid cookie header"),
        }
    }
    req.extensions_mut().insert(RequestCookies(cookies));

    Ok(req)
}

/// Flatten a response into the serverless output document.
///
/// `set-cookie` values go to `cookies`; other headers are comma-joined per
/// name. The body is always base64.
pub async fn convert(resp: Response) -> Result<ServerlessResponse> {
    let (parts, body) = resp.into_parts();
    let body: Bytes = body
        .collect()
        .await
        .map_err(|e| Error::Internal(format!("failed to read response body: {e}")))?
        .to_bytes();

    let mut headers = BTreeMap::new();
    let mut cookies = Vec::new();
    for name in parts.headers.keys() {
        let values: Vec<&str> = parts
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if name == SET_COOKIE {
            cookies.extend(values.into_iter().map(str::to_string));
        } else {
            headers.insert(name.as_str().to_string(), values.join(","));
        }
    }

    Ok(ServerlessResponse::new(parts.status.as_u16(), headers, cookies, &body))
}

/// Run one event through `router`.
///
/// A request that cannot be rebuilt yields a synthetic 400 response.
pub async fn handle_event(router: Router, event: &ServerlessEvent) -> Result<ServerlessResponse> {
    let req = match reconstruct(event) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "failed to rebuild request from event");
            return Ok(bad_request(&e));
        }
    };

    let resp = match router.oneshot(req).await {
        Ok(r) => r,
        Err(never) => match never {},
    };
    convert(resp).await
}

fn bad_request(e: &Error) -> ServerlessResponse {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), CONTENT_TYPE_TEXT.to_string());
    ServerlessResponse::new(400, headers, Vec::new(), e.to_string().as_bytes())
}

/// Read one event line from `input`, write one response line to `output`.
///
/// Unreadable input or an unparsable event is an error for the caller to
/// treat as fatal.
pub async fn run_once<R, W>(router: Router, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    input.read_line(&mut line).await?;
    if line.trim().is_empty() {
        return Err(Error::BadRequest("failed to read from stdin: empty input".into()));
    }

    let event = ServerlessEvent::from_json(&line)?;
    tracing::info!(method = %event.method(), uri = %event.uri(), "serverless invocation");

    let resp = handle_event(router, &event).await?;
    let json = resp.to_json()?;

    output.write_all(json.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
