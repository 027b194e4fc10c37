//! Serverless event and response documents (API-Gateway style JSON).
//!
//! Every input field is optional and unknown fields are ignored: real
//! gateways attach far more context than the adapter needs.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerlessEvent {
    pub raw_path: String,
    pub raw_query_string: String,
    /// Multi-value headers arrive comma-joined.
    pub headers: BTreeMap<String, String>,
    /// Raw `Cookie`-style strings.
    pub cookies: Vec<String>,
    pub is_base64_encoded: bool,
    pub body: String,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub http: HttpContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpContext {
    pub method: String,
}

impl ServerlessEvent {
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim())
            .map_err(|e| Error::BadRequest(format!("failed to parse request JSON: {e}")))
    }

    /// `rawPath[?rawQueryString]`, defaulting the path to `/`.
    pub fn uri(&self) -> String {
        let path = if self.raw_path.is_empty() { "/" } else { self.raw_path.as_str() };
        if self.raw_query_string.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", self.raw_query_string)
        }
    }

    /// Empty method means GET.
    pub fn method(&self) -> &str {
        let m = self.request_context.http.method.as_str();
        if m.is_empty() {
            "GET"
        } else {
            m
        }
    }

    pub fn body_bytes(&self) -> Result<Bytes> {
        if self.is_base64_encoded {
            codec::decode_base64(&self.body).map_err(|e| Error::BadRequest(e.to_string()))
        } else {
            Ok(Bytes::from(self.body.clone()))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// Raw `Set-Cookie` values, never folded into `headers`.
    pub cookies: Vec<String>,
    pub is_base64_encoded: bool,
    pub body: String,
}

impl ServerlessResponse {
    /// Build a response whose body is always base64 encoded.
    pub fn new(status_code: u16, headers: BTreeMap<String, String>, cookies: Vec<String>, body: &[u8]) -> Self {
        Self {
            status_code,
            headers,
            cookies,
            is_base64_encoded: true,
            body: codec::encode_base64(body),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::Internal(format!("failed to marshal JSON response: {e}")))
    }

    pub fn body_bytes(&self) -> Result<Bytes> {
        if self.is_base64_encoded {
            codec::decode_base64(&self.body).map_err(|e| Error::BadRequest(e.to_string()))
        } else {
            Ok(Bytes::from(self.body.clone()))
        }
    }
}
