mod admin;
mod bootstrap;
mod chatbot;
mod health;

use std::future::IntoFuture;

use anyhow::Result;
use arreda_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use arreda_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "arreda-server listening"
    );

    let grace_secs = app.config.server.graceful_shutdown_secs;
    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app.router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            let _ = drain_tx.send(());
        })
        .into_future();

    // Once the shutdown signal fires, open connections get at most
    // `graceful_shutdown_secs` to drain before the process exits anyway.
    tokio::pin!(server);
    tokio::select! {
        result = &mut server => result?,
        _ = async {
            let _ = drain_rx.await;
            tokio::time::sleep(std::time::Duration::from_secs(grace_secs)).await;
        } => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                grace_secs,
                "open connections did not drain before the shutdown deadline"
            );
        }
    }

    tracing::info!(event_name = "system.server.stopping", "arreda-server stopping");

    Ok(())
}
