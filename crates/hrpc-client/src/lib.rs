//! hrpc client stub.
//!
//! One generic [`Client`] per upstream, driven by `Method<Req, Resp>`
//! descriptors instead of per-service generated code.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
