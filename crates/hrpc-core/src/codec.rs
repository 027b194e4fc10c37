//! Message codec: typed messages <-> protobuf wire bytes.
//!
//! The codec never decides which type to decode into; that is resolved by the
//! procedure descriptor before `decode` is called.

use base64::Engine;
use bytes::{Bytes, BytesMut};
use thiserror::Error;

use crate::status::Status;

/// A registered, strongly-typed RPC message.
///
/// Blanket-implemented for every `prost` message, so generated or
/// hand-written `#[derive(prost::Message)]` structs qualify directly.
pub trait Message: prost::Message + Default + Send + Sync + 'static {
    /// Type name used in logs.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<T> Message for T where T: prost::Message + Default + Send + Sync + 'static {}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to marshal message: {0}")]
    Encode(#[from] prost::EncodeError),
    #[error("failed to unmarshal message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("failed to decode base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<CodecError> for Status {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Encode(_) => Status::internal(e.to_string()),
            CodecError::Decode(_) | CodecError::Base64(_) => Status::invalid_argument(e.to_string()),
        }
    }
}

pub fn encode<M: Message>(msg: &M) -> Result<Bytes, CodecError> {
    let mut buf = BytesMut::with_capacity(prost::Message::encoded_len(msg));
    prost::Message::encode(msg, &mut buf)?;
    Ok(buf.freeze())
}

pub fn decode<M: Message>(bytes: Bytes) -> Result<M, CodecError> {
    Ok(<M as prost::Message>::decode(bytes)?)
}

/// Standard (padded) base64, as used by serverless event bodies.
pub fn decode_base64(text: &str) -> Result<Bytes, CodecError> {
    let raw = base64::engine::general_purpose::STANDARD.decode(text)?;
    Ok(Bytes::from(raw))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
