//! hrpc core: transport-agnostic RPC primitives shared by client and server.
//!
//! This crate defines the status taxonomy, the message codec, procedure
//! descriptors, the wire envelope, and the serverless event shapes. It
//! carries no HTTP or runtime dependencies so both the client stub and the
//! server transports can build on the same contracts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed payloads,
//! events and cookies surface as `Error`/`Status` values instead of crashing
//! the process that decodes them.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod method;
pub mod protocol;
pub mod status;

pub use codec::Message;
pub use error::{Error, Result, RpcError};
pub use method::{Method, Target};
pub use protocol::envelope::{Envelope, Metadata};
pub use status::{Code, Status};
