//! Laser Arbiter - authoritative session server for two-player laser tag
//!
//! This is the main entry point. It runs:
//! - the hardware relay listener
//! - the serialized session pipeline
//! - an HTTP status surface for health checks and the latest state

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use laser_arbiter::app;
use laser_arbiter::config::Config;
use laser_arbiter::http::build_router;
use laser_arbiter::util::shutdown;
use laser_arbiter::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level, config.log_json);
    init_server_time();

    info!("Starting Laser Arbiter");
    info!(
        relay_addr = %config.relay_addr,
        status_addr = %config.status_addr,
        policy = ?config.mismatch_policy,
        "Configuration loaded"
    );

    let (trigger, stop) = shutdown::channel();
    let running = app::start(config.clone(), &trigger).await?;

    let router = build_router(running.app_state.clone());
    let listener = TcpListener::bind(config.status_addr).await?;

    info!("Status server listening on {}", config.status_addr);
    info!("Health check: http://{}/health", config.status_addr);
    info!("Relay endpoint: tcp://{}", running.relay_addr);

    let status = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { stop.wait().await })
            .await
    });

    shutdown_signal().await;
    trigger.trigger();

    if let Some(last) = running.join().await {
        info!(
            p1_hp = last.p1.hp,
            p2_hp = last.p2.hp,
            p1_deaths = last.p1.deaths,
            p2_deaths = last.p2.deaths,
            "Final session state"
        );
    }
    status.await??;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().with_target(true).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
