//! Greeter: the smallest service, two string-in string-out procedures.
//!
//! `say-hello` answers requests that name no procedure.

use hrpc_core::method::Method;
use hrpc_core::protocol::envelope::Metadata;
use hrpc_core::status::Status;

use crate::dispatch::{handler_fn, Dispatcher};

pub const SERVICE: &str = "greeter";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HelloRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HelloResponse {
    #[prost(string, tag = "1")]
    pub text: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ByeRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ByeResponse {
    #[prost(string, tag = "1")]
    pub text: String,
}

pub const SAY_HELLO: Method<HelloRequest, HelloResponse> = Method::new(SERVICE, "say-hello");
pub const SAY_BYE: Method<ByeRequest, ByeResponse> = Method::new(SERVICE, "say-bye");

pub fn register(dispatcher: &Dispatcher) {
    dispatcher.register_default(SAY_HELLO, handler_fn(say_hello));
    dispatcher.register(SAY_BYE, handler_fn(say_bye));
}

async fn say_hello(req: HelloRequest, _md: Metadata) -> Result<HelloResponse, Status> {
    tracing::info!(name = %req.name, "say-hello");
    Ok(HelloResponse {
        text: format!("Hello {}", req.name),
    })
}

async fn say_bye(req: ByeRequest, _md: Metadata) -> Result<ByeResponse, Status> {
    tracing::info!(name = %req.name, "say-bye");
    Ok(ByeResponse {
        text: format!("Bye {}", req.name),
    })
}
