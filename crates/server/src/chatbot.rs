//! Conversational-agent API. Responses are flat delimiter-encoded strings
//! wrapped in a `{"result": ...}` envelope so the Voiceflow side can split
//! them without a JSON walk.

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use arreda_core::chatbot::encode::{encode, join_blocks, FieldValue};
use arreda_core::chatbot::sanitize::sanitize;
use arreda_core::chatbot::tags;
use arreda_core::domain::client::{BotReply, Client, ClientPatch, ConversationEntry};
use arreda_core::domain::knowledge::KnowledgeItem;
use arreda_core::search::{search, SearchCriteria};
use arreda_db::repositories::{ClientRepository, KnowledgeRepository, RepositoryError};

#[derive(Clone)]
pub struct ChatbotState {
    pub clients: Arc<dyn ClientRepository>,
    pub knowledge: Arc<dyn KnowledgeRepository>,
    pub api_key: SecretString,
}

pub fn router(state: ChatbotState) -> Router {
    Router::new()
        .route("/api/chatbot/knowledge/search", get(search_knowledge))
        .route("/api/chatbot/clients/{id_voiceflow}", get(get_client).put(upsert_client))
        .route(
            "/api/chatbot/clients/{id_voiceflow}/conversazioni",
            axum::routing::post(save_conversation),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

#[derive(Serialize)]
struct ChatReply {
    result: String,
}

fn reply(result: impl Into<String>) -> Json<ChatReply> {
    Json(ChatReply { result: result.into() })
}

async fn require_api_key(
    State(state): State<ChatbotState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if presented != state.api_key.expose_secret() {
        tracing::warn!(event_name = "chatbot.auth.rejected", "invalid or missing api key");
        return (StatusCode::UNAUTHORIZED, reply(tags::API_KEY_NON_VALIDA)).into_response();
    }

    next.run(request).await
}

fn internal_error(error: RepositoryError) -> Response {
    tracing::error!(event_name = "chatbot.store.failed", %error, "store operation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, reply(tags::ERRORE_INTERNO)).into_response()
}

// --- knowledge search ---

#[derive(Deserialize)]
struct AgentSearchQuery {
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    consegna: Option<String>,
    #[serde(default)]
    prezzo: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bound(value: Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

fn encode_product(item: &KnowledgeItem) -> String {
    encode(
        tags::PRODOTTO_TROVATO,
        &[
            ("nome", FieldValue::from(sanitize(&item.nome))),
            ("tipo", FieldValue::from(sanitize(&item.tipo))),
            ("prezzo", FieldValue::from(sanitize(&item.prezzo))),
            ("consegna", FieldValue::from(sanitize(&item.consegna))),
            ("descrizione", FieldValue::from(sanitize(item.descrizione.as_deref().unwrap_or_default()))),
        ],
    )
}

async fn search_knowledge(
    State(state): State<ChatbotState>,
    Query(query): Query<AgentSearchQuery>,
) -> Response {
    let tipo = match non_empty(query.tipo) {
        Some(tipo) => tipo,
        None => return reply(tags::TIPO_MANCANTE).into_response(),
    };

    let criteria = SearchCriteria {
        tipo: Some(tipo.clone()),
        nome: non_empty(query.nome),
        consegna: parse_bound(query.consegna),
        prezzo: parse_bound(query.prezzo),
    };

    let items = match state.knowledge.list().await {
        Ok(items) => items,
        Err(error) => return internal_error(error),
    };

    let matches = search(&items, &criteria);
    if matches.is_empty() {
        return reply(tags::NESSUN_PRODOTTO_TROVATO).into_response();
    }

    tracing::info!(
        event_name = "chatbot.knowledge.searched",
        tipo = %tipo,
        matches = matches.len(),
        "knowledge search served"
    );

    let blocks: Vec<String> = matches.iter().map(encode_product).collect();
    reply(join_blocks(&blocks)).into_response()
}

// --- clients ---

fn encode_client(tag: &str, client: &Client) -> String {
    encode(
        tag,
        &[
            ("nome", FieldValue::from(sanitize(client.nome.as_deref().unwrap_or_default()))),
            ("numero", FieldValue::from(sanitize(client.numero.as_deref().unwrap_or_default()))),
            ("summary", FieldValue::from(sanitize(client.summary.as_deref().unwrap_or_default()))),
        ],
    )
}

fn external_id(raw: &str) -> Option<String> {
    let trimmed = sanitize(raw);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

async fn get_client(
    State(state): State<ChatbotState>,
    Path(id_voiceflow): Path<String>,
) -> Response {
    let id = match external_id(&id_voiceflow) {
        Some(id) => id,
        None => return reply(tags::ID_VOICEFLOW_MANCANTE).into_response(),
    };

    match state.clients.find_by_external_id(&id).await {
        Ok(Some(client)) => {
            reply(encode_client(tags::CLIENTE_TROVATO, &client)).into_response()
        }
        Ok(None) => reply(tags::CLIENTE_NON_TROVATO).into_response(),
        Err(error) => internal_error(error),
    }
}

#[derive(Deserialize)]
struct ClientPatchRequest {
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    numero: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl ClientPatchRequest {
    fn into_patch(self) -> ClientPatch {
        ClientPatch {
            nome: self.nome.as_deref().map(sanitize),
            numero: self.numero.as_deref().map(sanitize),
            summary: self.summary.as_deref().map(sanitize),
        }
    }
}

async fn upsert_client(
    State(state): State<ChatbotState>,
    Path(id_voiceflow): Path<String>,
    Json(request): Json<ClientPatchRequest>,
) -> Response {
    let id = match external_id(&id_voiceflow) {
        Some(id) => id,
        None => return reply(tags::ID_VOICEFLOW_MANCANTE).into_response(),
    };

    match state.clients.upsert_by_external_id(&id, request.into_patch()).await {
        Ok(client) => {
            tracing::info!(
                event_name = "chatbot.client.upserted",
                id_voiceflow = %client.id_voiceflow,
                "client record upserted"
            );
            reply(encode_client(tags::CLIENTE_AGGIORNATO, &client)).into_response()
        }
        Err(error) => internal_error(error),
    }
}

// --- conversations ---

#[derive(Deserialize)]
struct ConversationRequest {
    #[serde(default)]
    user: String,
    #[serde(default)]
    bot: Option<BotReply>,
}

fn sanitize_reply(reply: BotReply) -> BotReply {
    match reply {
        BotReply::Single(text) => BotReply::Single(sanitize(&text)),
        BotReply::Many(texts) => {
            BotReply::Many(texts.iter().map(|text| sanitize(text)).collect())
        }
    }
}

async fn save_conversation(
    State(state): State<ChatbotState>,
    Path(id_voiceflow): Path<String>,
    Json(request): Json<ConversationRequest>,
) -> Response {
    let id = match external_id(&id_voiceflow) {
        Some(id) => id,
        None => return reply(tags::ID_VOICEFLOW_MANCANTE).into_response(),
    };

    let entry = ConversationEntry {
        data: chrono::Utc::now(),
        user: sanitize(&request.user),
        bot: sanitize_reply(request.bot.unwrap_or_else(|| BotReply::Single(String::new()))),
    };

    match state.clients.append_conversation(&id, entry).await {
        Ok(true) => reply(tags::CONVERSAZIONE_SALVATA).into_response(),
        Ok(false) => reply(tags::CLIENTE_NON_TROVATO).into_response(),
        Err(error) => internal_error(error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use arreda_core::domain::client::{Client, ClientPatch};
    use arreda_core::domain::knowledge::{KnowledgeId, KnowledgeItem};
    use arreda_db::repositories::{
        ClientRepository, InMemoryClientRepository, InMemoryKnowledgeRepository,
    };

    use super::{router, ChatbotState};

    const KEY: &str = "chiave-di-prova";

    async fn test_state(items: Vec<KnowledgeItem>) -> ChatbotState {
        ChatbotState {
            clients: Arc::new(InMemoryClientRepository::default()),
            knowledge: Arc::new(InMemoryKnowledgeRepository::with_items(items).await),
            api_key: SecretString::from(KEY),
        }
    }

    fn item(nome: &str, prezzo: &str, consegna: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: KnowledgeId::generate(),
            tipo: "arredo".to_string(),
            nome: nome.to_string(),
            descrizione: Some("Sedia in rovere".to_string()),
            prezzo: prezzo.to_string(),
            consegna: consegna.to_string(),
            domande: vec!["Che stile preferisci?".to_string()],
            domande_finali: Vec::new(),
            categorie: Vec::new(),
            domande_categorie: Vec::new(),
            finiture: Vec::new(),
            domande_finiture: Vec::new(),
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-api-key", KEY)
            .body(Body::empty())
            .expect("request")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn result_of(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value: Value = serde_json::from_slice(&bytes).expect("json body");
        value["result"].as_str().expect("result string").to_string()
    }

    #[tokio::test]
    async fn requests_without_the_api_key_are_rejected() {
        let app = router(test_state(Vec::new()).await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chatbot/knowledge/search?tipo=arredo")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(result_of(response).await, "API_KEY_NON_VALIDA");
    }

    #[tokio::test]
    async fn search_without_tipo_reports_the_missing_category() {
        let app = router(test_state(Vec::new()).await);

        let response = app
            .clone()
            .oneshot(get_request("/api/chatbot/knowledge/search"))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "TIPO_MANCANTE");

        let response = app
            .oneshot(get_request("/api/chatbot/knowledge/search?tipo=%20"))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "TIPO_MANCANTE");
    }

    #[tokio::test]
    async fn search_encodes_each_match_as_a_flat_block() {
        let app = router(
            test_state(vec![
                item("Sedia Luna", "100-500€", "30-60 giorni"),
                item("Sedia Sole", "", "90 giorni"),
            ])
            .await,
        );

        let response = app
            .oneshot(get_request("/api/chatbot/knowledge/search?tipo=arredo"))
            .await
            .expect("response");
        let result = result_of(response).await;

        let blocks: Vec<&str> = result.split("|||").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            "PRODOTTO_TROVATO|nome:Sedia Luna|tipo:arredo|prezzo:100-500€|\
             consegna:30-60 giorni|descrizione:Sedia in rovere"
        );
        // Empty fields are omitted entirely, never rendered as "prezzo:".
        assert!(!blocks[1].contains("prezzo"));
    }

    #[tokio::test]
    async fn search_with_no_match_reports_it() {
        let app = router(test_state(vec![item("Sedia Luna", "", "")]).await);

        let response = app
            .oneshot(get_request("/api/chatbot/knowledge/search?tipo=cucina"))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "NESSUN_PRODOTTO_TROVATO");
    }

    #[tokio::test]
    async fn unknown_client_lookup_reports_not_found() {
        let app = router(test_state(Vec::new()).await);

        let response = app
            .oneshot(get_request("/api/chatbot/clients/vf-assente"))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "CLIENTE_NON_TROVATO");
    }

    #[tokio::test]
    async fn blank_external_id_reports_the_missing_identifier() {
        let app = router(test_state(Vec::new()).await);

        let response = app
            .oneshot(get_request("/api/chatbot/clients/%20%20"))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "ID_VOICEFLOW_MANCANTE");
    }

    #[tokio::test]
    async fn upsert_creates_then_preserves_fields_on_empty_updates() {
        let state = test_state(Vec::new()).await;
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/chatbot/clients/vf-1",
                json!({ "nome": "  {Mario}  ", "numero": "333 1234567" }),
            ))
            .await
            .expect("response");
        assert_eq!(
            result_of(response).await,
            "CLIENTE_AGGIORNATO|nome:Mario|numero:333 1234567"
        );

        // A later turn that knows nothing sends empty strings and zeros;
        // the stored values must survive.
        app.clone()
            .oneshot(json_request(
                "PUT",
                "/api/chatbot/clients/vf-1",
                json!({ "nome": "", "numero": "0", "summary": "Cerca una sedia" }),
            ))
            .await
            .expect("response");

        let response =
            app.oneshot(get_request("/api/chatbot/clients/vf-1")).await.expect("response");
        assert_eq!(
            result_of(response).await,
            "CLIENTE_TROVATO|nome:Mario|numero:333 1234567|summary:Cerca una sedia"
        );
    }

    #[tokio::test]
    async fn conversation_turns_are_sanitized_and_appended() {
        let state = test_state(Vec::new()).await;
        state
            .clients
            .upsert_by_external_id("vf-1", ClientPatch::default())
            .await
            .expect("seed client");
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chatbot/clients/vf-1/conversazioni",
                json!({ "user": "\"Cerco {una} sedia\"", "bot": ["Certo!", "Che stile?"] }),
            ))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "CONVERSAZIONE_SALVATA");

        let client = state
            .clients
            .find_by_external_id("vf-1")
            .await
            .expect("lookup")
            .expect("client exists");
        assert_eq!(client.conversazioni.len(), 1);
        assert_eq!(client.conversazioni[0].user, "Cerco una sedia");
        assert_eq!(
            client.conversazioni[0].bot.messages(),
            vec!["Certo!".to_string(), "Che stile?".to_string()]
        );
    }

    #[tokio::test]
    async fn conversation_for_unknown_client_reports_not_found() {
        let app = router(test_state(Vec::new()).await);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chatbot/clients/vf-assente/conversazioni",
                json!({ "user": "Ciao", "bot": "Ciao!" }),
            ))
            .await
            .expect("response");
        assert_eq!(result_of(response).await, "CLIENTE_NON_TROVATO");
    }

    #[tokio::test]
    async fn lookup_omits_empty_client_fields() {
        let state = test_state(Vec::new()).await;
        state.clients.insert(Client::new("vf-2")).await.expect("seed client");
        let app = router(state);

        let response =
            app.oneshot(get_request("/api/chatbot/clients/vf-2")).await.expect("response");
        assert_eq!(result_of(response).await, "CLIENTE_TROVATO");
    }
}
