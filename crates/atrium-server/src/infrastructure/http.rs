//! HTTP surface: axum router, error mapping and the listener loop.
//!
//! # Routes
//!
//! | Method | Path                  | Body / response                         |
//! |--------|-----------------------|-----------------------------------------|
//! | GET    | `/health`             | `{"status":"healthy"}`                  |
//! | GET    | `/api/config`         | stored document, `{}` when none         |
//! | POST   | `/api/config`         | JSON object, replaces the document      |
//! | DELETE | `/api/config`         | removes the document                    |
//! | POST   | `/api/config/import`  | configuration, replaces the document    |
//! | GET    | `/api/stats`          | [`SystemStats`]                         |
//! | GET    | `/api/stats/cpu`      | `{"cpu": percent}`                      |
//! | GET    | `/api/stats/memory`   | `{"memory": {...}}`                     |
//! | GET    | `/api/stats/network`  | `{"network": [...]}`                    |
//!
//! Every error answer carries `{"error": "<message>"}`.  Unknown paths get
//! `404` with `{"error":"Not found"}`.  Responses allow any origin so a
//! dashboard served from another port can poll the stats routes.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use atrium_core::{BackendError, PersistenceBackend};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::application::{ApiError, ConfigApi};
use crate::domain::{ServerConfig, SystemStats};
use crate::infrastructure::proc_stats::ProcStats;
use crate::infrastructure::storage::DocumentStore;

// ── Shared state ──────────────────────────────────────────────────────────────

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState<B> {
    pub config: ConfigApi<B>,
    pub stats: ProcStats,
}

impl<B: PersistenceBackend> AppState<B> {
    pub fn new(backend: B, stats: ProcStats) -> Self {
        Self {
            config: ConfigApi::new(backend),
            stats,
        }
    }
}

type Shared<B> = State<Arc<AppState<B>>>;

// ── Error mapping ─────────────────────────────────────────────────────────────

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Backend(BackendError::Malformed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            error!(error = %self, "config request failed");
        }
        error_body(status, &self.to_string())
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Unwraps a JSON body, turning axum's rejection into our error shape.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected request body");
        ApiError::BadRequest(rejection.body_text())
    })
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Builds the application router over any persistence backend.
pub fn router<B>(state: Arc<AppState<B>>) -> Router
where
    B: PersistenceBackend + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/config",
            get(get_config::<B>)
                .post(post_config::<B>)
                .delete(delete_config::<B>),
        )
        .route("/api/config/import", post(import_config::<B>))
        .route("/api/stats", get(all_stats::<B>))
        .route("/api/stats/cpu", get(cpu_stats::<B>))
        .route("/api/stats/memory", get(memory_stats::<B>))
        .route("/api/stats/network", get(network_stats::<B>))
        .fallback(not_found)
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

async fn allow_any_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "Not found")
}

async fn get_config<B: PersistenceBackend>(
    State(state): Shared<B>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.config.fetch().await?))
}

async fn post_config<B: PersistenceBackend>(
    State(state): Shared<B>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body)?;
    state.config.store(&body).await?;
    Ok(Json(json!({ "status": "saved" })))
}

async fn delete_config<B: PersistenceBackend>(
    State(state): Shared<B>,
) -> Result<Json<Value>, ApiError> {
    state.config.delete().await?;
    Ok(Json(json!({ "status": "deleted" })))
}

async fn import_config<B: PersistenceBackend>(
    State(state): Shared<B>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body)?;
    state.config.import(&body).await?;
    Ok(Json(json!({ "status": "imported" })))
}

async fn all_stats<B: PersistenceBackend>(State(state): Shared<B>) -> Json<SystemStats> {
    Json(state.stats.snapshot().await)
}

async fn cpu_stats<B: PersistenceBackend>(State(state): Shared<B>) -> Json<Value> {
    Json(json!({ "cpu": state.stats.cpu().await.percent }))
}

async fn memory_stats<B: PersistenceBackend>(State(state): Shared<B>) -> Json<Value> {
    Json(json!({ "memory": state.stats.memory().await }))
}

async fn network_stats<B: PersistenceBackend>(State(state): Shared<B>) -> Json<Value> {
    Json(json!({ "network": state.stats.network().await }))
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// Serves `state` on an already-bound listener until `shutdown` resolves.
///
/// Tests bind `127.0.0.1:0` themselves and pass the listener in so they can
/// read the chosen port before the server starts.
///
/// # Errors
///
/// Returns an error if the underlying accept loop fails.
pub async fn serve<B, F>(listener: TcpListener, state: AppState<B>, shutdown: F) -> anyhow::Result<()>
where
    B: PersistenceBackend + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("Atrium server listening on {addr}");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("Atrium server on {addr} stopped");
    Ok(())
}

/// Binds `config.bind_addr` and serves the file-backed document store.
///
/// # Errors
///
/// Returns an error if the port cannot be bound (already in use, no
/// permission) or the server loop fails.
pub async fn run_server<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.bind_addr))?;

    let store = DocumentStore::in_dir(&config.data_dir);
    info!(document = %store.path().display(), "using configuration document");

    let state = AppState::new(store, ProcStats::new(&config.proc_root));
    serve(listener, state, shutdown).await
}
