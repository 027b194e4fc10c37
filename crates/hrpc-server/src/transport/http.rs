//! HTTP transport: one POST per RPC.
//!
//! Routes:
//! - `POST {base}/:service/:procedure`
//! - `POST {base}/:service` with the procedure in the `rpc-name` header,
//!   falling back to the service's default procedure
//!
//! The HTTP status is always 200; the RPC outcome is the status header.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use hrpc_core::protocol::envelope::{
    receive_body, Envelope, Metadata, Reply, RPC_NAME_HEADER, STATUS_HEADER, TRANSFER_ENCODING_HEADER,
};
use hrpc_core::status::Status;

use crate::app_state::AppState;
use crate::obs::ServerMetrics;

// --------------------
// Handlers
// --------------------
pub async fn rpc_by_path(
    State(state): State<AppState>,
    Path((service, procedure)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, service, Some(procedure), headers, body).await
}

pub async fn rpc_by_header(
    State(state): State<AppState>,
    Path(service): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, service, None, headers, body).await
}

async fn handle(
    state: AppState,
    service: String,
    procedure: Option<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let procedure = procedure
        .or_else(|| {
            headers
                .get(RPC_NAME_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| {
            state
                .dispatcher()
                .default_procedure(&service)
                .map(str::to_string)
        });

    let span = tracing::info_span!(
        "rpc",
        service = %service,
        procedure = procedure.as_deref().unwrap_or("-"),
    );

    async move {
        let Some(procedure) = procedure else {
            tracing::warn!("request without procedure name");
            return reply_response(Reply::Err(Status::unimplemented(format!(
                "unknown RPC name: missing {RPC_NAME_HEADER} header"
            ))));
        };

        let payload = match receive_body(body, is_base64(&headers)) {
            Ok(p) => p,
            Err(status) => {
                tracing::warn!(error = %status, "request body rejected");
                return reply_response(Reply::Err(status));
            }
        };

        let _in_flight = InFlight::enter(state.metrics());

        let env = Envelope {
            service,
            procedure,
            payload,
            metadata: to_metadata(&headers),
        };
        let reply = state.dispatcher().dispatch(env).await;
        tracing::debug!(code = %reply.code(), "rpc done");

        reply_response(reply)
    }
    .instrument(span)
    .await
}

/// Counts a request in `hrpc_requests_in_flight` until dropped, including
/// when the connection goes away and the handler future is cancelled.
struct InFlight(Arc<ServerMetrics>);

impl InFlight {
    fn enter(metrics: Arc<ServerMetrics>) -> Self {
        metrics.requests_in_flight.inc(&[]);
        Self(metrics)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.requests_in_flight.dec(&[]);
    }
}

// --------------------
// Envelope <-> HTTP
// --------------------
fn is_base64(headers: &HeaderMap) -> bool {
    headers
        .get(TRANSFER_ENCODING_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("base64"))
        .unwrap_or(false)
}

fn to_metadata(headers: &HeaderMap) -> Metadata {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)))
        .collect()
}

/// Encode a reply as the HTTP response the client stub expects.
pub fn reply_response(reply: Reply) -> Response {
    let status_value = HeaderValue::from(reply.code().to_transport_code());
    let content_type = HeaderValue::from_static(reply.content_type());
    (
        StatusCode::OK,
        [(STATUS_HEADER, status_value), (header::CONTENT_TYPE.as_str(), content_type)],
        reply.into_body(),
    )
        .into_response()
}
