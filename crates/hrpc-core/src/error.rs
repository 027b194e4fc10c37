//! Shared error types across hrpc crates.

use thiserror::Error;

use crate::status::{Code, Status};

/// Shared result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process-level error used by config loading, event parsing and bootstrap.
///
/// Per-request RPC outcomes never travel through this type; they are
/// [`Status`] values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// Stable kind string, used in tests and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::Config(_) => "CONFIG",
            Error::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Error::Io(_) => "IO",
            Error::Internal(_) => "INTERNAL",
        }
    }
}

/// Failure returned by the client stub.
///
/// A well-formed failure from the server, a timeout, or a refused connection
/// is always a `Status`. `Protocol` is reserved for responses that break the
/// envelope contract (missing status header, undecodable OK body).
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("rpc failed: {0}")]
    Status(Status),
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl RpcError {
    pub fn code(&self) -> Code {
        match self {
            RpcError::Status(s) => s.code(),
            RpcError::Protocol(_) => Code::Unknown,
        }
    }

    /// Collapse into a `Status`, e.g. to propagate an upstream failure from
    /// inside a handler.
    pub fn status(&self) -> Status {
        match self {
            RpcError::Status(s) => s.clone(),
            RpcError::Protocol(msg) => Status::new(Code::Unknown, msg.clone()),
        }
    }
}

impl From<Status> for RpcError {
    fn from(s: Status) -> Self {
        RpcError::Status(s)
    }
}

impl From<RpcError> for Status {
    fn from(e: RpcError) -> Self {
        e.status()
    }
}
