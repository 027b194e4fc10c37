//! RPC wire envelope.
//!
//! Request: `POST <base>/<service>/<procedure>` with the encoded request as
//! body. Response: HTTP 200 always; the RPC outcome travels in the
//! `grpc-status` header, the body is the encoded response on OK or the UTF-8
//! status message otherwise.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::codec;
use crate::method::Method;
use crate::status::{Code, Status};

/// Canonical status header (integer code).
pub const STATUS_HEADER: &str = "grpc-status";
/// Header name some older services emit instead of `grpc-status`.
pub const LEGACY_STATUS_HEADER: &str = "grpc-code";
/// Procedure name when it is not encoded in the path.
pub const RPC_NAME_HEADER: &str = "rpc-name";
/// Set to `base64` when the request body is base64 text instead of raw bytes.
pub const TRANSFER_ENCODING_HEADER: &str = "content-transfer-encoding";

pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";
pub const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Header bag passed through to handlers and forwarded by the client.
///
/// Keys are lower-cased; repeated values are comma-joined, matching how the
/// serverless event format flattens headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing value.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries.insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Add a value, comma-joining with an existing one.
    pub fn append(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        let key = key.as_ref().to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(value.as_ref());
            }
            None => {
                self.entries.insert(key, value.as_ref().to_string());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&key.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut md = Metadata::new();
        for (k, v) in iter {
            md.append(k, v);
        }
        md
    }
}

/// One inbound or outbound call.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub service: String,
    pub procedure: String,
    pub payload: Bytes,
    pub metadata: Metadata,
}

impl Envelope {
    /// Build the client-side envelope for `method`.
    pub fn request<Req: codec::Message, Resp>(
        method: &Method<Req, Resp>,
        request: &Req,
        metadata: Metadata,
    ) -> Result<Self, Status> {
        let payload = codec::encode(request)?;
        Ok(Self {
            service: method.service().to_string(),
            procedure: method.procedure().to_string(),
            payload,
            metadata,
        })
    }
}

/// Turn a received body into raw payload bytes.
///
/// Base64 bodies are decoded here; a malformed one is `InvalidArgument`.
pub fn receive_body(body: Bytes, is_base64: bool) -> Result<Bytes, Status> {
    if !is_base64 {
        return Ok(body);
    }
    let text = std::str::from_utf8(&body)
        .map_err(|e| Status::invalid_argument(format!("failed to decode base64 body: {e}")))?;
    Ok(codec::decode_base64(text.trim())?)
}

/// Outcome of one dispatched call, ready for a transport to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(Bytes),
    Err(Status),
}

impl Reply {
    /// Reconstruct a reply from the status header value and body.
    pub fn from_wire(code: i32, body: Bytes) -> Self {
        match Code::from_transport_code(code) {
            Code::Ok => Reply::Ok(body),
            other => Reply::Err(Status::new(other, String::from_utf8_lossy(&body).into_owned())),
        }
    }

    pub fn code(&self) -> Code {
        match self {
            Reply::Ok(_) => Code::Ok,
            Reply::Err(s) => s.code(),
        }
    }

    /// Value for the status header.
    pub fn status_header_value(&self) -> String {
        self.code().to_transport_code().to_string()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Reply::Ok(_) => CONTENT_TYPE_BINARY,
            Reply::Err(_) => CONTENT_TYPE_TEXT,
        }
    }

    /// Body bytes: the encoded message on OK, the status message otherwise.
    pub fn into_body(self) -> Bytes {
        match self {
            Reply::Ok(b) => b,
            Reply::Err(s) => Bytes::from(s.message().to_string()),
        }
    }

    pub fn into_result(self) -> Result<Bytes, Status> {
        match self {
            Reply::Ok(b) => Ok(b),
            Reply::Err(s) => Err(s),
        }
    }
}

impl From<Result<Bytes, Status>> for Reply {
    fn from(r: Result<Bytes, Status>) -> Self {
        match r {
            Ok(b) => Reply::Ok(b),
            // An error status that claims OK would be ambiguous on the wire.
            Err(s) if s.is_ok() => Reply::Err(Status::internal("handler failed without a status")),
            Err(s) => Reply::Err(s),
        }
    }
}
