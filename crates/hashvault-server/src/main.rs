//! # `hashvault-server`
//!
//! HTTP front end for [`hashvault`]: accepts passwords, answers with a request
//! id immediately, and serves the SHA-512 digest once the delayed hash job has
//! run.
//!
//! ## Lifecycle
//! - Binding the listener is the only fatal failure.
//! - `/shutdown`, Ctrl+C, or SIGTERM stop the acceptance of new work.
//! - Open connections and pending hash jobs are drained, bounded by the
//!   shutdown timeout; past it, the stop is forced and logged.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin hashvault-server --release -- 8080
//! ```

mod server;

use anyhow::Context;
use clap::Parser;
use hashvault::{HashService, StopOutcome};
use server::config::{CliArgs, ServerConfig};
use server::http::router;
use server::telemetry::{JobMetrics, increment_forced_stops, init_telemetry, shutdown_telemetry};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log_startup_info(&addr, &config);

    let service = HashService::with_observer(
        config.hash_delay,
        config.shutdown_timeout,
        Arc::new(JobMetrics),
    );
    let outcome = run_server(listener, service, config.form_path.as_deref()).await;
    shutdown_telemetry(providers);

    match outcome {
        StopOutcome::Clean => tracing::info!("Service shut down successfully"),
        StopOutcome::Forced => tracing::warn!("Service shut down after forcing the drain"),
    }
    Ok(())
}

fn log_startup_info(addr: &SocketAddr, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Listening on http://{} with full config: {:#?}",
            addr,
            config
        );
    } else {
        tracing::info!(
            "Listening on http://{} (hash delay {:?}, shutdown timeout {:?})",
            addr,
            config.hash_delay,
            config.shutdown_timeout
        );
    }
}

/// Serves `listener` until shutdown is triggered, then drains connections and
/// pending hash jobs.
async fn run_server(
    listener: TcpListener,
    service: HashService,
    form_path: Option<&Path>,
) -> StopOutcome {
    let app = router(service.clone(), form_path);

    // Stops accepting connections as soon as shutdown is triggered; requests
    // already in flight are allowed to finish.
    let server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(service.shutdown_triggered())
            .into_future(),
    );
    tokio::spawn(shutdown_signal(service.clone()));

    service.shutdown_triggered().await;

    let abort = server.abort_handle();
    let outcome = service
        .drain(async move {
            match server.await {
                Ok(Ok(())) => tracing::debug!("All connections closed"),
                Ok(Err(e)) => tracing::error!("Server error while draining: {e}"),
                Err(e) => tracing::error!("Server task failed: {e}"),
            }
        })
        .await;

    if outcome == StopOutcome::Forced {
        increment_forced_stops();
        abort.abort();
    }
    outcome
}

/// Triggers shutdown on Ctrl+C or SIGTERM. Returns early if shutdown was
/// already requested some other way.
async fn shutdown_signal(service: HashService) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
        () = service.shutdown_triggered() => return,
    }

    service.trigger_shutdown();
}
