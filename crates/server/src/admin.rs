//! Operator-facing JSON API for client records and the knowledge base.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use arreda_core::domain::client::{Client, ClientId};
use arreda_core::domain::knowledge::{Categoria, Finitura, KnowledgeId, KnowledgeItem};
use arreda_core::errors::DomainError;
use arreda_core::search::{search, SearchCriteria};
use arreda_db::repositories::{ClientRepository, KnowledgeRepository, RepositoryError};

#[derive(Clone)]
pub struct AdminState {
    pub clients: Arc<dyn ClientRepository>,
    pub knowledge: Arc<dyn KnowledgeRepository>,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/knowledge", get(list_knowledge).post(create_knowledge))
        .route("/api/knowledge/search", get(search_knowledge))
        .route(
            "/api/knowledge/{id}",
            get(get_knowledge).put(update_knowledge).delete(delete_knowledge),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

enum AdminError {
    BadRequest(String),
    NotFound(&'static str),
    Conflict(&'static str),
    Internal,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AdminError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            AdminError::Conflict(message) => (StatusCode::CONFLICT, message.to_string()),
            AdminError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Errore interno del server".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<RepositoryError> for AdminError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::DuplicateExternalId(_) => {
                AdminError::Conflict("Cliente già esistente")
            }
            other => {
                tracing::error!(event_name = "admin.store.failed", error = %other, "store operation failed");
                AdminError::Internal
            }
        }
    }
}

impl From<DomainError> for AdminError {
    fn from(error: DomainError) -> Self {
        AdminError::BadRequest(error.to_string())
    }
}

// --- clients ---

#[derive(Deserialize)]
struct CreateClientRequest {
    #[serde(default)]
    id_voiceflow: Option<String>,
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    numero: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct UpdateClientRequest {
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    numero: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

async fn list_clients(State(state): State<AdminState>) -> Result<Json<Vec<Client>>, AdminError> {
    Ok(Json(state.clients.list().await?))
}

async fn get_client(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, AdminError> {
    let client = state
        .clients
        .find_by_id(&ClientId(id))
        .await?
        .ok_or(AdminError::NotFound("Cliente non trovato"))?;
    Ok(Json(client))
}

async fn create_client(
    State(state): State<AdminState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), AdminError> {
    let id_voiceflow = match request.id_voiceflow.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(AdminError::BadRequest("id_voiceflow obbligatorio".to_string())),
    };

    let mut client = Client::new(&id_voiceflow);
    client.nome = request.nome;
    client.numero = request.numero;
    client.summary = request.summary;

    state.clients.insert(client.clone()).await?;

    tracing::info!(
        event_name = "admin.client.created",
        id_voiceflow = %client.id_voiceflow,
        "client created"
    );

    Ok((StatusCode::CREATED, Json(client)))
}

async fn update_client(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Client>, AdminError> {
    let mut client = state
        .clients
        .find_by_id(&ClientId(id))
        .await?
        .ok_or(AdminError::NotFound("Cliente non trovato"))?;

    // Operator edits are authoritative: any field present in the body
    // replaces the stored value, unlike the agent-side partial update.
    if let Some(nome) = request.nome {
        client.nome = Some(nome);
    }
    if let Some(numero) = request.numero {
        client.numero = Some(numero);
    }
    if let Some(summary) = request.summary {
        client.summary = Some(summary);
    }
    client.data_modifica = Utc::now();

    if !state.clients.update(client.clone()).await? {
        return Err(AdminError::NotFound("Cliente non trovato"));
    }

    Ok(Json(client))
}

async fn delete_client(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AdminError> {
    let client = state
        .clients
        .find_by_id(&ClientId(id))
        .await?
        .ok_or(AdminError::NotFound("Cliente non trovato"))?;

    if !state.clients.delete(&client.id).await? {
        return Err(AdminError::NotFound("Cliente non trovato"));
    }

    tracing::info!(
        event_name = "admin.client.deleted",
        id_voiceflow = %client.id_voiceflow,
        "client deleted"
    );

    Ok(Json(serde_json::json!({ "success": true })))
}

// --- knowledge ---

#[derive(Deserialize)]
struct KnowledgeBody {
    #[serde(default)]
    tipo: String,
    #[serde(default)]
    nome: String,
    #[serde(default)]
    descrizione: Option<String>,
    #[serde(default)]
    prezzo: String,
    #[serde(default)]
    consegna: String,
    #[serde(default)]
    domande: Vec<String>,
    #[serde(default)]
    domande_finali: Vec<String>,
    #[serde(default)]
    categorie: Vec<Categoria>,
    #[serde(default)]
    domande_categorie: Vec<String>,
    #[serde(default)]
    finiture: Vec<Finitura>,
    #[serde(default)]
    domande_finiture: Vec<String>,
}

impl KnowledgeBody {
    fn into_item(self, id: KnowledgeId) -> KnowledgeItem {
        KnowledgeItem {
            id,
            tipo: self.tipo,
            nome: self.nome,
            descrizione: self.descrizione,
            prezzo: self.prezzo,
            consegna: self.consegna,
            domande: self.domande,
            domande_finali: self.domande_finali,
            categorie: self.categorie,
            domande_categorie: self.domande_categorie,
            finiture: self.finiture,
            domande_finiture: self.domande_finiture,
        }
    }
}

#[derive(Deserialize)]
struct KnowledgeSearchQuery {
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    consegna: Option<String>,
    #[serde(default)]
    prezzo: Option<String>,
}

impl KnowledgeSearchQuery {
    fn into_criteria(self) -> SearchCriteria {
        SearchCriteria {
            tipo: non_empty(self.tipo),
            nome: non_empty(self.nome),
            consegna: parse_bound(self.consegna),
            prezzo: parse_bound(self.prezzo),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Numeric bounds arrive as query-string text; anything that is not a
/// plain integer is treated as an absent filter.
fn parse_bound(value: Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

async fn list_knowledge(
    State(state): State<AdminState>,
    Query(query): Query<KnowledgeSearchQuery>,
) -> Result<Json<Vec<KnowledgeItem>>, AdminError> {
    let criteria = query.into_criteria();
    let items = state.knowledge.list().await?;
    if criteria.is_empty() {
        return Ok(Json(items));
    }
    Ok(Json(search(&items, &criteria)))
}

async fn search_knowledge(
    State(state): State<AdminState>,
    Query(query): Query<KnowledgeSearchQuery>,
) -> Result<Json<Vec<KnowledgeItem>>, AdminError> {
    let criteria = query.into_criteria();
    let items = state.knowledge.list().await?;
    Ok(Json(search(&items, &criteria)))
}

async fn get_knowledge(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<KnowledgeItem>, AdminError> {
    let item = state
        .knowledge
        .find_by_id(&KnowledgeId(id))
        .await?
        .ok_or(AdminError::NotFound("Prodotto non trovato"))?;
    Ok(Json(item))
}

async fn create_knowledge(
    State(state): State<AdminState>,
    Json(body): Json<KnowledgeBody>,
) -> Result<(StatusCode, Json<KnowledgeItem>), AdminError> {
    let mut item = body.into_item(KnowledgeId::generate());
    item.validate()?;
    item.normalize_sub_fields();

    state.knowledge.insert(item.clone()).await?;

    tracing::info!(
        event_name = "admin.knowledge.created",
        nome = %item.nome,
        tipo = %item.tipo,
        "knowledge item created"
    );

    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_knowledge(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Json(body): Json<KnowledgeBody>,
) -> Result<Json<KnowledgeItem>, AdminError> {
    let mut item = body.into_item(KnowledgeId(id));
    item.validate()?;
    item.normalize_sub_fields();

    if !state.knowledge.update(item.clone()).await? {
        return Err(AdminError::NotFound("Prodotto non trovato"));
    }

    Ok(Json(item))
}

async fn delete_knowledge(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AdminError> {
    if !state.knowledge.delete(&KnowledgeId(id)).await? {
        return Err(AdminError::NotFound("Prodotto non trovato"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
