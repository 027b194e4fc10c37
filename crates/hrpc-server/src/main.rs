//! hrpc server binary.
//!
//! - HTTP mode: axum listener with graceful shutdown (draining flips
//!   `/readyz` to 503 before in-flight requests finish)
//! - Serverless mode (`RUN_LAMBDA=1`): one JSON event on stdin, one JSON
//!   response on stdout, then exit
//!
//! Logs go to stderr so stdout stays a single JSON line in serverless mode.

use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use hrpc_core::error::{Error, Result};
use hrpc_server::app_state::AppState;
use hrpc_server::config::{self, Mode};
use hrpc_server::router;
use hrpc_server::transport::serverless;

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "hrpc-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let mode = cfg.server.mode;
    let listen = cfg.server.listen.clone();

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    match mode {
        Mode::Serverless => {
            let stdin = BufReader::new(tokio::io::stdin());
            serverless::run_once(app, stdin, tokio::io::stdout()).await
        }
        Mode::Http => serve(state, app, &listen).await,
    }
}

async fn serve(state: AppState, app: axum::Router, listen: &str) -> Result<()> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| Error::Config(format!("server.listen must be a valid SocketAddr: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        base_path = %state.cfg().server.base_path,
        procedures = state.dispatcher().registered_targets().len(),
        "hrpc-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;
    tracing::info!("hrpc-server stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    state.set_draining();
    tracing::info!("signal received, draining");
}
