//! Typed procedure handlers.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use hrpc_core::codec::Message;
use hrpc_core::protocol::envelope::Metadata;
use hrpc_core::status::Status;

/// Business logic behind one procedure.
///
/// Handlers receive an already decoded request plus the inbound metadata and
/// answer with a response or a `Status`. Generic errors can be folded in with
/// `Status::from_error`, which maps them to `Internal`.
#[async_trait]
pub trait Handler<Req: Message, Resp: Message>: Send + Sync + 'static {
    async fn call(&self, request: Req, metadata: Metadata) -> Result<Resp, Status>;
}

#[async_trait]
impl<Req, Resp, H> Handler<Req, Resp> for Arc<H>
where
    Req: Message,
    Resp: Message,
    H: Handler<Req, Resp> + ?Sized,
{
    async fn call(&self, request: Req, metadata: Metadata) -> Result<Resp, Status> {
        (**self).call(request, metadata).await
    }
}

/// Adapter turning an async closure into a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

pub fn handler_fn<Req, Resp, F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Req, Metadata) -> Fut,
    Fut: Future<Output = Result<Resp, Status>>,
{
    HandlerFn { f }
}

#[async_trait]
impl<Req, Resp, F, Fut> Handler<Req, Resp> for HandlerFn<F>
where
    Req: Message,
    Resp: Message,
    F: Fn(Req, Metadata) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
{
    async fn call(&self, request: Req, metadata: Metadata) -> Result<Resp, Status> {
        (self.f)(request, metadata).await
    }
}
