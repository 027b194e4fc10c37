//! Built-in demo services.
//!
//! Each service exposes its message types and `Method` descriptors so the
//! same constants drive both the server registry and remote clients.

pub mod cart;
pub mod catalog;
pub mod greeter;

use std::sync::Arc;

use hrpc_core::error::{Error, Result};

use crate::dispatch::Dispatcher;

/// Service names accepted in `services:`.
pub const KNOWN: &[&str] = &[greeter::SERVICE, catalog::SERVICE, cart::SERVICE];

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

/// Register the named service with its default backing store.
pub fn register(dispatcher: &Dispatcher, name: &str) -> Result<()> {
    match name {
        greeter::SERVICE => greeter::register(dispatcher),
        catalog::SERVICE => catalog::register(dispatcher, Arc::new(catalog::Catalog::builtin()?)),
        cart::SERVICE => cart::register(dispatcher, Arc::new(cart::InMemoryCartStore::new())),
        other => return Err(Error::Config(format!("unknown service: {other}"))),
    }
    tracing::info!(service = name, "service registered");
    Ok(())
}
