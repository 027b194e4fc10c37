//! Dispatcher module exports.
//!
//! Re-exports the registry and the handler trait so services can depend on
//! this module directly.

pub mod dispatcher;
pub mod handler;

pub use dispatcher::Dispatcher;
pub use handler::{handler_fn, Handler, HandlerFn};
