//! Axum router wiring.
//!
//! Ops endpoints live at the root; RPC routes are mounted under
//! `server.base_path`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.cfg().server.max_body_bytes;
    let prefix = state.cfg().server.route_prefix().map(str::to_string);

    let rpc = Router::new()
        .route("/:service", post(transport::http::rpc_by_header))
        .route("/:service/:procedure", post(transport::http::rpc_by_path));
    let rpc = match prefix {
        Some(prefix) => Router::new().nest(&prefix, rpc),
        None => rpc,
    };

    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .merge(rpc)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
