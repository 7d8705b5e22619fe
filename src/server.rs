//! HTTP API.
//!
//! JSON endpoints for chat, events, admin login and reindexing. Errors are
//! returned as `{"error": "<message>"}`.

use crate::auth::{AuthService, Claims, TokenResponse};
use crate::error::HelperError;
use crate::events::{Event, EventInput, EventStore};
use crate::index::{IndexService, IndexStatus, RebuildOutcome};
use crate::rag::QueryService;
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state.
pub struct AppState {
    pub index: Arc<IndexService>,
    pub events: Arc<EventStore>,
    pub auth: Arc<AuthService>,
    pub query: Arc<QueryService>,
}

impl AppState {
    fn require_admin(&self, headers: &HeaderMap) -> Result<Claims, ApiError> {
        let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        Ok(self.auth.authorize_header(header)?)
    }
}

/// Build the router with permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", delete(delete_event))
        .route("/login", post(login))
        .route("/admin/reindex", post(reindex))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on an already-bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

// === Errors ===

/// A [`HelperError`] on its way to becoming an HTTP response.
pub struct ApiError(HelperError);

impl From<HelperError> for ApiError {
    fn from(err: HelperError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            HelperError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            HelperError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HelperError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            HelperError::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// === Request/Response Types ===

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    index: IndexStatus,
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        index: state.index.status(),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = state.query.answer(&req.message).await?;
    Ok(Json(ChatResponse {
        response: response.answer,
    }))
}

async fn list_events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.events.list().await?))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<EventInput>,
) -> Result<Json<Event>, ApiError> {
    state.require_admin(&headers)?;
    Ok(Json(state.events.create(input).await?))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.require_admin(&headers)?;
    state.events.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    Ok(Json(state.auth.login(&req.username, &req.password)?))
}

async fn reindex(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    state.require_admin(&headers)?;

    let index = Arc::clone(&state.index);
    tokio::spawn(async move {
        match index.rebuild().await {
            Ok(RebuildOutcome::Installed { chunks, generation, .. }) => {
                info!("Admin reindex installed generation {} ({} chunks)", generation, chunks)
            }
            Ok(RebuildOutcome::Empty) => info!("Admin reindex found no documents"),
            Err(e) => warn!("Admin reindex failed: {}", e),
        }
    });

    Ok(Json(MessageResponse {
        message: "Reindexing started in background.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::config::{AuthSettings, Prompts};
    use crate::testing::{KeywordEmbedder, ScriptedChatModel};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;

    struct TestServer {
        base: String,
        dir: TempDir,
        state: Arc<AppState>,
        embedder: Arc<KeywordEmbedder>,
        chat: Arc<ScriptedChatModel>,
        client: reqwest::Client,
    }

    impl TestServer {
        async fn start() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("kb")).unwrap();

            let embedder = Arc::new(KeywordEmbedder::new());
            let chat = Arc::new(ScriptedChatModel::new("Orientation Day is next week."));
            let index = Arc::new(IndexService::new(
                dir.path().join("kb"),
                dir.path().join("index"),
                ChunkingConfig::default(),
                embedder.clone(),
            ));
            let events = Arc::new(EventStore::new(dir.path().join("events.json")));
            events.seed_if_empty().await.unwrap();
            let auth = Arc::new(AuthService::new(&AuthSettings {
                admin_password: "s3cret".to_string(),
                secret_key: "signing-key".to_string(),
                ..AuthSettings::default()
            }));
            let query = Arc::new(QueryService::new(
                index.clone(),
                events.clone(),
                chat.clone(),
                Prompts::default(),
                3,
            ));
            let state = Arc::new(AppState {
                index,
                events,
                auth,
                query,
            });

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            tokio::spawn(serve(listener, state.clone()));

            Self {
                base,
                dir,
                state,
                embedder,
                chat,
                client: reqwest::Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn token(&self) -> String {
            let body: Value = self
                .client
                .post(self.url("/login"))
                .json(&json!({"username": "admin", "password": "s3cret"}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body["access_token"].as_str().unwrap().to_string()
        }

        async fn event_count(&self) -> usize {
            self.state.events.list().await.unwrap().len()
        }
    }

    #[tokio::test]
    async fn test_seeded_events_are_listed() {
        let server = TestServer::start().await;
        let resp = server.client.get(server.url("/events")).send().await.unwrap();
        assert_eq!(resp.status(), 200);

        let events: Vec<Event> = resp.json().await.unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Orientation Day", "Coding Club Meetup"]);
    }

    #[tokio::test]
    async fn test_login() {
        let server = TestServer::start().await;
        let resp = server
            .client
            .post(server.url("/login"))
            .json(&json!({"username": "admin", "password": "nope"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Incorrect username or password");

        assert!(!server.token().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_event_requires_token() {
        let server = TestServer::start().await;
        let event = json!({
            "name": "Career Fair",
            "date": "2030-02-01",
            "location": "Gym",
            "details": "Bring your CV."
        });

        let resp = server.client.post(server.url("/events")).json(&event).send().await.unwrap();
        assert_eq!(resp.status(), 401);
        let resp = server
            .client
            .post(server.url("/events"))
            .bearer_auth("forged.token.value")
            .json(&event)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(server.event_count().await, 2);

        let resp = server
            .client
            .post(server.url("/events"))
            .bearer_auth(server.token().await)
            .json(&event)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let created: Event = resp.json().await.unwrap();
        assert_eq!(created.name, "Career Fair");
        assert!(!created.id.is_empty());
        assert_eq!(server.event_count().await, 3);
    }

    #[tokio::test]
    async fn test_create_event_rejects_bad_date() {
        let server = TestServer::start().await;
        let resp = server
            .client
            .post(server.url("/events"))
            .bearer_auth(server.token().await)
            .json(&json!({"name": "X", "date": "tomorrow", "location": "", "details": ""}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(server.event_count().await, 2);
    }

    #[tokio::test]
    async fn test_delete_event() {
        let server = TestServer::start().await;
        let token = server.token().await;

        let resp = server
            .client
            .delete(server.url("/events/does-not-exist"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Event not found");
        assert_eq!(server.event_count().await, 2);

        let id = server.state.events.list().await.unwrap()[0].id.clone();
        let resp = server
            .client
            .delete(server.url(&format!("/events/{}", id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = server
            .client
            .delete(server.url(&format!("/events/{}", id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
        assert_eq!(server.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_chat_is_rejected_without_model_calls() {
        let server = TestServer::start().await;
        std::fs::write(server.dir.path().join("kb/info.txt"), "Campus opens at 8am.").unwrap();

        let resp = server
            .client
            .post(server.url("/chat"))
            .json(&json!({"message": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Empty message");
        assert_eq!(server.embedder.calls(), 0);
        assert_eq!(server.chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_answers_and_reports_unavailable_index() {
        let server = TestServer::start().await;

        let resp = server
            .client
            .post(server.url("/chat"))
            .json(&json!({"message": "When is orientation?"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Vector store not available.");

        std::fs::write(server.dir.path().join("kb/info.txt"), "Orientation is held in the Main Auditorium.").unwrap();
        let resp = server
            .client
            .post(server.url("/chat"))
            .json(&json!({"message": "When is orientation?"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["response"], "Orientation Day is next week.");
    }

    #[tokio::test]
    async fn test_reindex_runs_in_background() {
        let server = TestServer::start().await;
        std::fs::write(server.dir.path().join("kb/info.txt"), "Parking permits are required.").unwrap();

        let resp = server.client.post(server.url("/admin/reindex")).send().await.unwrap();
        assert_eq!(resp.status(), 401);

        let resp = server
            .client
            .post(server.url("/admin/reindex"))
            .bearer_auth(server.token().await)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Reindexing started in background.");

        let mut installed = false;
        for _ in 0..100 {
            let health: Value = server
                .client
                .get(server.url("/health"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if health["index"]["installed"] == true {
                assert_eq!(health["index"]["generation"], 1);
                installed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(installed);
    }
}
