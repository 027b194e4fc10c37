//! Top-level facade crate for hrpc.
//!
//! Re-exports the core primitives, the client stub and the server library so
//! users can depend on a single crate.

pub mod core {
    pub use hrpc_core::*;
}

pub mod client {
    pub use hrpc_client::*;
}

pub mod server {
    pub use hrpc_server::*;
}

pub use hrpc_client::{Client, ClientConfig};
pub use hrpc_core::{Code, Metadata, Method, RpcError, Status};
