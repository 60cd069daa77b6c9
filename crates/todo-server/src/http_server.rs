//! HTTP server for the health, metrics and todo endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use healthcheck::HealthOrchestrator;
use healthcheck::types::{OK_STATUS, SELF_LABEL};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use store::TodoStore;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<HealthOrchestrator>,
    pub store: Arc<TodoStore>,
    /// Deadline for one health check; `None` waits for the probes
    pub health_timeout: Option<Duration>,
}

/// Body of `POST /todos` and `DELETE /todos`
#[derive(Debug, Deserialize)]
pub struct TodoRequest {
    pub todo: String,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/todos",
            get(list_todos_handler)
                .post(add_todo_handler)
                .delete(delete_todo_handler),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// HTTP server for the todo service
pub struct HttpServer {
    state: AppState,
    /// Listen address
    listen_addr: String,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(state: AppState, listen_addr: String) -> Self {
        Self { state, listen_addr }
    }

    /// Run the HTTP server until ctrl-c
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!(listen_addr = %self.listen_addr, "Starting HTTP server");

        let app = router(self.state);

        let listener = TcpListener::bind(&self.listen_addr).await?;
        info!(listen_addr = %self.listen_addr, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Handler for /health
async fn health_handler(State(state): State<AppState>) -> Response {
    let check = state.orchestrator.check_health();

    let Some(limit) = state.health_timeout else {
        return Json(check.await).into_response();
    };

    match tokio::time::timeout(limit, check).await {
        Ok(health) => Json(health).into_response(),
        Err(_) => {
            warn!(timeout = ?limit, "Health check timed out");
            let mut body = BTreeMap::new();
            body.insert(SELF_LABEL.to_string(), OK_STATUS.to_string());
            body.insert(
                "error".to_string(),
                format!("health check exceeded {:?}", limit),
            );
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// Handler for /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.orchestrator.metrics().encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            buffer,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

fn store_error(e: common::Error) -> Response {
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
}

fn empty_todo() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "todo must not be empty" })),
    )
        .into_response()
}

/// Handler for GET /todos
async fn list_todos_handler(State(state): State<AppState>) -> Response {
    match state.store.read_all().await {
        Ok(todos) => Json(todos).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to read todos");
            store_error(e)
        }
    }
}

/// Handler for POST /todos
async fn add_todo_handler(
    State(state): State<AppState>,
    Json(request): Json<TodoRequest>,
) -> Response {
    if request.todo.trim().is_empty() {
        return empty_todo();
    }

    match state.store.append(&request.todo).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to save todo");
            store_error(e)
        }
    }
}

/// Handler for DELETE /todos
async fn delete_todo_handler(
    State(state): State<AppState>,
    Json(request): Json<TodoRequest>,
) -> Response {
    if request.todo.trim().is_empty() {
        return empty_todo();
    }

    match state.store.remove(&request.todo).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to delete todo");
            store_error(e)
        }
    }
}
