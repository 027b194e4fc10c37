//! Generic client stub.
//!
//! Flow per call:
//! - encode the request and build the envelope
//! - `POST <addr>/<service>/<procedure>` with the configured timeout
//! - non-2xx, refused connection or timeout => `Unavailable`
//! - 2xx without a status header => protocol violation
//! - OK => decode the response type fixed by the method descriptor;
//!   anything else => `RpcError::Status` with the body as message
//!
//! There is no retry here; callers decide what to do with `Unavailable`.

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};

use hrpc_core::codec::{self, Message};
use hrpc_core::error::{Error, Result, RpcError};
use hrpc_core::method::Method;
use hrpc_core::protocol::envelope::{
    Envelope, Metadata, Reply, CONTENT_TYPE_BINARY, LEGACY_STATUS_HEADER, RPC_NAME_HEADER, STATUS_HEADER,
    TRANSFER_ENCODING_HEADER,
};
use hrpc_core::status::Status;

use crate::config::ClientConfig;

/// Caller metadata that must not be forwarded verbatim.
///
/// Covers the envelope's own headers and the hop-by-hop set, so metadata
/// received by a handler can be passed straight into an upstream call.
const RESERVED_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "host",
    STATUS_HEADER,
    LEGACY_STATUS_HEADER,
    RPC_NAME_HEADER,
    TRANSFER_ENCODING_HEADER,
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        cfg.validate()?;
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| Error::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `method` and decode its response type.
    pub async fn call<Req: Message, Resp: Message>(
        &self,
        method: &Method<Req, Resp>,
        request: &Req,
        metadata: Option<&Metadata>,
    ) -> std::result::Result<Resp, RpcError> {
        self.call_with_metadata(method, request, metadata)
            .await
            .map(|(resp, _)| resp)
    }

    /// Like [`Client::call`], also returning the response headers.
    pub async fn call_with_metadata<Req: Message, Resp: Message>(
        &self,
        method: &Method<Req, Resp>,
        request: &Req,
        metadata: Option<&Metadata>,
    ) -> std::result::Result<(Resp, Metadata), RpcError> {
        let env = Envelope::request(method, request, metadata.cloned().unwrap_or_default())?;
        tracing::debug!(target_rpc = %method.target(), bytes = env.payload.len(), "rpc call");

        let (reply, headers) = self.send(env).await?;
        let body = reply.into_result().map_err(|s| {
            tracing::debug!(target_rpc = %method.target(), code = %s.code(), "rpc returned error status");
            RpcError::Status(s)
        })?;

        let resp = codec::decode::<Resp>(body)
            .map_err(|e| RpcError::Protocol(format!("{}: {e}", Resp::type_name())))?;
        Ok((resp, headers))
    }

    async fn send(&self, env: Envelope) -> std::result::Result<(Reply, Metadata), RpcError> {
        let url = format!("{}/{}/{}", self.base_url, env.service, env.procedure);

        let mut req = self.http.post(&url);
        for (k, v) in env.metadata.iter() {
            if RESERVED_HEADERS.contains(&k) {
                continue;
            }
            req = req.header(k, v);
        }
        req = req.header(CONTENT_TYPE, CONTENT_TYPE_BINARY).body(env.payload);

        let resp = req.send().await.map_err(send_error)?;

        if !resp.status().is_success() {
            return Err(Status::unavailable(format!("received non-OK response: {}", resp.status())).into());
        }

        let code = status_code(resp.headers())?;
        let headers = to_metadata(resp.headers());
        let body: Bytes = resp
            .bytes()
            .await
            .map_err(|e| RpcError::Status(Status::unavailable(format!("failed to read response body: {e}"))))?;

        Ok((Reply::from_wire(code, body), headers))
    }
}

fn send_error(e: reqwest::Error) -> RpcError {
    if e.is_builder() {
        return Status::internal(format!("failed to create HTTP request: {e}")).into();
    }
    if e.is_timeout() {
        return Status::unavailable(format!("request timed out: {e}")).into();
    }
    Status::unavailable(format!("failed to send HTTP request: {e}")).into()
}

fn status_code(headers: &HeaderMap) -> std::result::Result<i32, RpcError> {
    let raw = headers
        .get(STATUS_HEADER)
        .or_else(|| headers.get(LEGACY_STATUS_HEADER))
        .ok_or_else(|| RpcError::Protocol(format!("missing {STATUS_HEADER} header")))?;

    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .ok_or_else(|| RpcError::Protocol(format!("failed to parse {STATUS_HEADER} header: {raw:?}")))
}

fn to_metadata(headers: &HeaderMap) -> Metadata {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)))
        .collect()
}
