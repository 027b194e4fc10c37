use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use thiserror::Error;

use hrpc_core::codec::{self, CodecError, Message};
use hrpc_core::method::{Method, Target};
use hrpc_core::protocol::envelope::{Envelope, Metadata, Reply};
use hrpc_core::status::{Code, Status};

use crate::dispatch::Handler;
use crate::obs::ServerMetrics;

/// Label used for calls that never resolved to a registered procedure.
const UNKNOWN_PROCEDURE: &str = "unknown";

#[derive(Debug, Error)]
enum DispatchError {
    #[error("{0}")]
    Decode(CodecError),
    #[error("{0}")]
    Handler(Status),
    #[error("{0}")]
    Encode(CodecError),
}

/// A registered procedure with its request/response types erased.
#[async_trait]
trait ErasedProcedure: Send + Sync {
    async fn invoke(&self, payload: Bytes, metadata: Metadata) -> Result<Bytes, DispatchError>;
}

struct Procedure<Req, Resp, H> {
    handler: H,
    _types: PhantomData<fn(Req) -> Resp>,
}

#[async_trait]
impl<Req, Resp, H> ErasedProcedure for Procedure<Req, Resp, H>
where
    Req: Message,
    Resp: Message,
    H: Handler<Req, Resp>,
{
    async fn invoke(&self, payload: Bytes, metadata: Metadata) -> Result<Bytes, DispatchError> {
        let request = codec::decode::<Req>(payload).map_err(DispatchError::Decode)?;
        let response = self
            .handler
            .call(request, metadata)
            .await
            .map_err(DispatchError::Handler)?;
        codec::encode(&response).map_err(DispatchError::Encode)
    }
}

/// Procedure registry and dispatcher shared by every service in the process.
///
/// Populated at startup; lookups afterwards only read.
#[derive(Default)]
pub struct Dispatcher {
    services: DashMap<&'static str, HashMap<&'static str, Arc<dyn ErasedProcedure>>>,
    defaults: DashMap<&'static str, &'static str>,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher that records request counts, latencies and decode errors.
    pub fn with_metrics(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            services: DashMap::new(),
            defaults: DashMap::new(),
            metrics: Some(metrics),
        }
    }

    /// Bind `handler` to the target of `method`. Re-registering replaces.
    pub fn register<Req, Resp, H>(&self, method: Method<Req, Resp>, handler: H)
    where
        Req: Message,
        Resp: Message,
        H: Handler<Req, Resp>,
    {
        let target = method.target();
        let procedure: Arc<dyn ErasedProcedure> = Arc::new(Procedure {
            handler,
            _types: PhantomData,
        });
        let replaced = self
            .services
            .entry(target.service)
            .or_default()
            .insert(target.procedure, procedure);
        if replaced.is_some() {
            tracing::warn!(target_rpc = %target, "procedure registered twice; replacing");
        }
    }

    /// Register `handler` and make it the procedure a request to the service
    /// resolves to when it names none (bare `/<service>`, no `rpc-name`).
    pub fn register_default<Req, Resp, H>(&self, method: Method<Req, Resp>, handler: H)
    where
        Req: Message,
        Resp: Message,
        H: Handler<Req, Resp>,
    {
        let target = method.target();
        self.register(method, handler);
        self.defaults.insert(target.service, target.procedure);
    }

    /// Procedure used for `service` when the request names none.
    pub fn default_procedure(&self, service: &str) -> Option<&'static str> {
        self.defaults.get(service).map(|p| *p.value())
    }

    pub fn registered_services(&self) -> Vec<&'static str> {
        let mut out: Vec<_> = self.services.iter().map(|e| *e.key()).collect();
        out.sort_unstable();
        out
    }

    pub fn registered_targets(&self) -> Vec<Target> {
        let mut out: Vec<Target> = self
            .services
            .iter()
            .flat_map(|e| {
                let service = *e.key();
                e.value()
                    .keys()
                    .map(|procedure| Target { service, procedure: *procedure })
                    .collect::<Vec<_>>()
            })
            .collect();
        out.sort_by(|a, b| (a.service, a.procedure).cmp(&(b.service, b.procedure)));
        out
    }

    fn lookup(&self, service: &str, procedure: &str) -> Option<(Target, Arc<dyn ErasedProcedure>)> {
        let svc = self.services.get(service)?;
        let (name, p) = svc.get_key_value(procedure)?;
        Some((
            Target {
                service: *svc.key(),
                procedure: *name,
            },
            Arc::clone(p),
        ))
    }

    /// Run one call end to end. Every failure becomes a `Status` in the reply.
    pub async fn dispatch(&self, env: Envelope) -> Reply {
        let started = Instant::now();

        let Some((target, procedure)) = self.lookup(&env.service, &env.procedure) else {
            tracing::warn!(service = %env.service, procedure = %env.procedure, "unknown procedure");
            let status = Status::unimplemented(format!("unknown RPC name: {}", env.procedure));
            self.record(UNKNOWN_PROCEDURE, status.code(), started);
            return Reply::Err(status);
        };

        let label = target.to_string();
        let reply = match procedure.invoke(env.payload, env.metadata).await {
            Ok(body) => Reply::Ok(body),
            Err(DispatchError::Decode(e)) => {
                tracing::warn!(target_rpc = %target, error = %e, "request decode failed");
                if let Some(m) = &self.metrics {
                    m.decode_errors.inc(&[("procedure", &label)]);
                }
                Reply::Err(Status::from(e))
            }
            Err(DispatchError::Handler(status)) => {
                tracing::debug!(target_rpc = %target, code = %status.code(), detail = %status.message(), "handler returned error");
                Reply::from(Err::<Bytes, _>(status))
            }
            Err(DispatchError::Encode(e)) => {
                tracing::error!(target_rpc = %target, error = %e, "response encode failed");
                Reply::Err(Status::from(e))
            }
        };

        self.record(&label, reply.code(), started);
        reply
    }

    fn record(&self, procedure: &str, code: Code, started: Instant) {
        if let Some(m) = &self.metrics {
            m.requests.inc(&[("procedure", procedure), ("code", code.as_str())]);
            m.dispatch_duration.observe(&[("procedure", procedure)], started.elapsed());
        }
    }
}
