//! Transport layer.
//!
//! Both transports end in the same router: `http` serves it from a TCP
//! listener, `serverless` drives it in-process from a JSON event.

pub mod http;
pub mod serverless;
