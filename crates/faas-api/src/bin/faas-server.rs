//! Process entry point: load config, initialize logging, wire up the
//! scheduler against the bundled mock runtime, spawn the janitor, and serve
//! the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use faas_log::LogConfig;
use faas_runtime::{MockRuntime, MockRuntimeConfig};
use faas_scheduler::{Janitor, Scheduler, SchedulerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = faas_log::init(&LogConfig::from_env());

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "faas-scheduler.toml".to_string());
    let config = match SchedulerConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, path = %config_path, "invalid configuration");
            return Err(err.into());
        }
    };

    let runtime = Arc::new(MockRuntime::new(MockRuntimeConfig {
        launch_latency: Duration::from_millis(config.mock_launch_latency_ms),
        invoke_latency: Duration::from_millis(config.mock_invoke_latency_ms),
        transport_failure_rate: 0.0,
    }));

    let bind_addr = config.bind_addr.clone();
    let warm_time = config.warm_time;
    let janitor_sleep = config.janitor_sleep;

    let scheduler = Arc::new(Scheduler::new(&config, runtime));
    let janitor = Janitor::spawn(Arc::clone(&scheduler), warm_time, janitor_sleep);

    let state = faas_api::AppState::new(scheduler);
    let router = faas_api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "faas-scheduler listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    janitor.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
