use std::sync::Arc;

use axum::Router;

use arreda_core::config::AppConfig;
use arreda_db::repositories::{
    ClientRepository, KnowledgeRepository, SqlClientRepository, SqlKnowledgeRepository,
};
use arreda_db::{connect_with_settings, migrations, DbPool};

use crate::{admin, chatbot};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

/// Connects to the database, applies pending migrations, and wires the
/// operator and chatbot routers over the SQL-backed stores.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::Connect)?;

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migrate)?;

    tracing::info!(
        event_name = "system.database.ready",
        url = %config.database.url,
        "database connected and migrated"
    );

    let clients: Arc<dyn ClientRepository> =
        Arc::new(SqlClientRepository::new(db_pool.clone()));
    let knowledge: Arc<dyn KnowledgeRepository> =
        Arc::new(SqlKnowledgeRepository::new(db_pool.clone()));

    let router = build_router(&config, clients, knowledge);

    Ok(Application { config, db_pool, router })
}

pub fn build_router(
    config: &AppConfig,
    clients: Arc<dyn ClientRepository>,
    knowledge: Arc<dyn KnowledgeRepository>,
) -> Router {
    let admin_router = admin::router(admin::AdminState {
        clients: clients.clone(),
        knowledge: knowledge.clone(),
    });
    let chatbot_router = chatbot::router(chatbot::ChatbotState {
        clients,
        knowledge,
        api_key: config.chatbot.api_key.clone(),
    });

    admin_router.merge(chatbot_router)
}
