//! Ticketgate server assembly.
//!
//! Wires configuration into the admission controller, route gate and router,
//! then serves until a shutdown signal arrives.
//!
//! ```text
//! Config ──▶ RateLimitStore ──▶ AdmissionController ──┐
//!        ──▶ OrderRules, GatePolicies ────────────────┼──▶ RouteGate ──▶ Router
//!        ──▶ IntakeService ───────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod metrics;

use anyhow::Context as _;
use axum::{Router, routing::get};
use config::{Config, RateLimitBackend};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::IntoFuture;
use std::sync::Arc;
use ticketgate_admission::AdmissionController;
use ticketgate_admission::stores::MemoryRateLimitStore;
use ticketgate_admission::sweeper::spawn_sweeper;
use ticketgate_core::InMemoryIntakeService;
use ticketgate_core::environment::SystemClock;
use ticketgate_web::{AdmissionCheck, AppState, RouteGate, build_router};
use tokio::signal;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A fully wired application, ready to serve.
pub struct App {
    /// HTTP router
    pub router: Router,
    /// Background sweeper, present for the in-memory backend
    pub sweeper: Option<JoinHandle<()>>,
}

/// Build the application from configuration.
///
/// # Errors
///
/// Returns an error if a rate policy is invalid or the selected backend
/// cannot be reached.
pub async fn build_app(
    config: &Config,
    prometheus: Option<PrometheusHandle>,
) -> anyhow::Result<App> {
    let policies = config
        .rate_limit
        .policies()
        .context("Invalid rate limit configuration")?;

    let (admission, sweeper) = build_admission(config).await?;

    let gate = RouteGate::new(admission, Arc::new(InMemoryIntakeService::new()))
        .with_rules(config.orders.rules())
        .with_policies(policies);

    let mut router = build_router(AppState::new(gate));

    if let Some(handle) = prometheus {
        router = router.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    Ok(App { router, sweeper })
}

async fn build_admission(
    config: &Config,
) -> anyhow::Result<(Arc<dyn AdmissionCheck>, Option<JoinHandle<()>>)> {
    match config.rate_limit.backend {
        RateLimitBackend::Memory => {
            let store =
                MemoryRateLimitStore::new().with_max_entries(config.rate_limit.max_entries);
            let controller = Arc::new(AdmissionController::new(store, SystemClock));
            let sweep = config.rate_limit.sweep_config();
            let sweeper = spawn_sweeper(Arc::clone(&controller), sweep);
            let admission: Arc<dyn AdmissionCheck> = controller;

            tracing::info!(
                max_entries = config.rate_limit.max_entries,
                sweep_interval_secs = sweep.interval.as_secs(),
                max_idle_secs = sweep.max_idle.as_secs(),
                "Using in-memory rate limit store"
            );
            Ok((admission, Some(sweeper)))
        }
        RateLimitBackend::Redis => build_redis_admission(config).await,
    }
}

#[cfg(feature = "redis")]
async fn build_redis_admission(
    config: &Config,
) -> anyhow::Result<(Arc<dyn AdmissionCheck>, Option<JoinHandle<()>>)> {
    use ticketgate_admission::stores::RedisRateLimitStore;

    let store = RedisRateLimitStore::new(&config.rate_limit.redis_url)
        .await
        .context("Failed to connect to Redis rate limit store")?;
    tracing::info!("Using Redis rate limit store");

    // Redis expires keys itself; no sweeper.
    let admission: Arc<dyn AdmissionCheck> =
        Arc::new(AdmissionController::new(store, SystemClock));
    Ok((admission, None))
}

#[cfg(not(feature = "redis"))]
#[allow(clippy::unused_async)]
async fn build_redis_admission(
    _config: &Config,
) -> anyhow::Result<(Arc<dyn AdmissionCheck>, Option<JoinHandle<()>>)> {
    anyhow::bail!("RATE_LIMIT_BACKEND=redis requires the `redis` feature")
}

/// Build the application and serve it until a shutdown signal arrives.
///
/// In-flight requests get `SHUTDOWN_TIMEOUT` seconds to finish after the
/// signal; the sweeper is stopped once the server exits.
///
/// # Errors
///
/// Returns an error if the application cannot be built or the listener
/// cannot bind.
pub async fn run(config: Config, prometheus: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let App { router, sweeper } = build_app(&config, prometheus).await?;

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(address = %addr, "HTTP server listening");

    let shutdown_started = Arc::new(Notify::new());
    let signal = {
        let shutdown_started = Arc::clone(&shutdown_started);
        async move {
            shutdown_signal().await;
            shutdown_started.notify_one();
        }
    };

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .into_future();
    let drain_deadline = async {
        shutdown_started.notified().await;
        tokio::time::sleep(config.shutdown_timeout()).await;
    };

    let result = tokio::select! {
        result = server => result.context("HTTP server error"),
        () = drain_deadline => {
            tracing::warn!(
                timeout_secs = config.server.shutdown_timeout,
                "Graceful shutdown timed out, dropping in-flight requests"
            );
            Ok(())
        }
    };

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Server stopped");

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(error = %error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
