//! Protocol modules (RPC envelope + serverless event).
//!
//! - Envelope: the HTTP-level RPC container, status header and reply body.
//! - Event: the JSON documents exchanged in serverless mode, plus the header
//!   and cookie rules needed to turn them back into a real HTTP request.
//!
//! All parsers are panic-free: malformed input is reported as `Error` or
//! `Status` instead of panicking.

pub mod cookie;
pub mod envelope;
pub mod event;
pub mod headers;
