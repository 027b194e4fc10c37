//! Shared application state.
//!
//! Holds the validated config, the procedure registry and the metrics
//! registry. Cloning is cheap; everything lives behind `Arc`.

use std::sync::Arc;

use hrpc_core::error::Result;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::obs::ServerMetrics;
use crate::services;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<ServerMetrics>,
}

struct AppStateInner {
    cfg: ServerConfig,
}

impl AppState {
    /// Build state and register every service listed in the config.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let names = cfg.services.clone();
        Self::with_registry(cfg, |dispatcher| {
            names.iter().try_for_each(|name| services::register(dispatcher, name))
        })
    }

    /// Build state whose procedures come from `register` instead of the
    /// configured service list. The dispatcher shares the state's metrics.
    ///
    /// Fails if a registered service would be shadowed by an ops route.
    pub fn with_registry<F>(cfg: ServerConfig, register: F) -> Result<Self>
    where
        F: FnOnce(&Dispatcher) -> Result<()>,
    {
        let metrics = Arc::new(ServerMetrics::default());
        let dispatcher = Dispatcher::with_metrics(Arc::clone(&metrics));
        register(&dispatcher)?;
        for service in dispatcher.registered_services() {
            cfg.server.check_service_name(service)?;
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Point-in-time values appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![(
            "hrpc_registered_procedures",
            self.dispatcher.registered_targets().len() as u64,
        )]
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use bytes::Bytes;
    use hrpc_core::method::Method;
    use hrpc_core::protocol::envelope::{Envelope, Metadata};
    use hrpc_core::status::{Code, Status};

    use super::*;
    use crate::dispatch::handler_fn;
    use crate::services::Empty;

    const NOOP: Method<Empty, Empty> = Method::new("lab", "noop");
    const SHADOWED: Method<Empty, Empty> = Method::new("metrics", "scrape");

    async fn noop(_: Empty, _: Metadata) -> std::result::Result<Empty, Status> {
        Ok(Empty {})
    }

    #[tokio::test]
    async fn custom_registry_records_into_state_metrics() {
        let state = AppState::with_registry(ServerConfig::default(), |d| {
            d.register(NOOP, handler_fn(noop));
            Ok(())
        })
        .unwrap();

        let env = Envelope {
            service: "lab".into(),
            procedure: "noop".into(),
            payload: Bytes::new(),
            metadata: Metadata::new(),
        };
        let reply = state.dispatcher().dispatch(env).await;
        assert_eq!(reply.code(), Code::Ok);
        assert_eq!(state.metrics().requests.get(&[("procedure", "lab/noop"), ("code", "OK")]), 1);
        assert_eq!(state.metrics_extra(), vec![("hrpc_registered_procedures", 1)]);
    }

    #[test]
    fn ops_named_service_needs_a_base_path() {
        let err = AppState::with_registry(ServerConfig::default(), |d| {
            d.register(SHADOWED, handler_fn(noop));
            Ok(())
        })
        .err()
        .unwrap();
        assert_eq!(err.kind(), "BAD_REQUEST");

        let mut cfg = ServerConfig::default();
        cfg.server.base_path = "/rpc".into();
        let state = AppState::with_registry(cfg, |d| {
            d.register(SHADOWED, handler_fn(noop));
            Ok(())
        })
        .unwrap();
        assert_eq!(state.dispatcher().registered_services(), vec!["metrics"]);
    }
}
