use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use arreda_db::DbPool;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// Serves `/health` on its own port so probes keep working even when the
/// main router is saturated.
pub async fn spawn(bind_address: &str, port: u16, pool: DbPool) -> anyhow::Result<()> {
    let router = Router::new().route("/health", get(health)).with_state(pool);
    let listener = tokio::net::TcpListener::bind(format!("{bind_address}:{port}")).await?;

    tracing::info!(event_name = "system.health.started", port, "health endpoint listening");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(event_name = "system.health.failed", %error, "health endpoint stopped");
        }
    });

    Ok(())
}

async fn health(State(pool): State<DbPool>) -> (StatusCode, Json<HealthResponse>) {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ok", database: "ok" })),
        Err(error) => {
            tracing::error!(
                event_name = "system.health.db_unreachable",
                %error,
                "database check failed"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "degraded", database: "unreachable" }),
            )
        }
    }
}
