//! HTTP transport: a single JSON-RPC endpoint at `POST /mcp`.
//!
//! Two modes share one router. Stateless mode builds a fresh dispatcher per
//! request and ignores session headers entirely. Session mode allocates an
//! opaque id on `initialize`, returns it in the `Mcp-Session-Id` response
//! header, and routes every later request through the dispatcher bound to the
//! id the client echoes back.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::backend::BackendClient;
use crate::gemini::GeminiClient;
use crate::registry::ToolRegistry;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::tools::{self, ToolSet};

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Protocol revision offered when the client does not name one.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

const SERVER_NAME: &str = "taskbridge";

/// Whether the server tracks per-client sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Stateless,
    Sessions,
}

/// One parsed JSON-RPC request. `id` is `None` for notifications.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Method dispatch over one tool registry.
///
/// In session mode one dispatcher lives per session; in stateless mode one is
/// built per request. Either way it holds no transport state.
pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Handle one request and produce the complete JSON-RPC response value.
    pub async fn handle(&self, request: &JsonRpcRequest) -> Value {
        let id = request.id.clone().unwrap_or(Value::Null);
        match request.method.as_str() {
            "initialize" => {
                let client_version = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str)
                    .unwrap_or(PROTOCOL_VERSION);
                rpc_result(
                    id,
                    json!({
                        "protocolVersion": client_version,
                        "capabilities": { "tools": {} },
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION"),
                        },
                    }),
                )
            }
            "ping" => rpc_result(id, json!({})),
            "tools/list" => rpc_result(id, self.registry.catalog()),
            "tools/call" => {
                let params = request.params.as_ref().cloned().unwrap_or(Value::Null);
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

                match self.registry.call(&name, arguments).await {
                    Some(result) => rpc_result(id, result),
                    None => rpc_error(id, -32602, format!("Unknown tool: {name}")),
                }
            }
            other => rpc_error(id, -32601, format!("Method not found: {other}")),
        }
    }
}

fn rpc_result(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn rpc_error(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Shared router state: mode, tool selection, and the configured clients the
/// dispatchers are built from.
pub struct AppState {
    mode: ServerMode,
    tools: ToolSet,
    backend: Option<BackendClient>,
    gemini: Option<GeminiClient>,
    sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        mode: ServerMode,
        tools: ToolSet,
        backend: Option<BackendClient>,
        gemini: Option<GeminiClient>,
    ) -> Self {
        Self::with_session_store(
            mode,
            tools,
            backend,
            gemini,
            Arc::new(InMemorySessionStore::default()),
        )
    }

    /// Like [`AppState::new`], with an injected session store.
    pub fn with_session_store(
        mode: ServerMode,
        tools: ToolSet,
        backend: Option<BackendClient>,
        gemini: Option<GeminiClient>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            mode,
            tools,
            backend,
            gemini,
            sessions,
        }
    }

    fn fresh_dispatcher(&self) -> Dispatcher {
        Dispatcher::new(tools::build_registry(
            self.tools,
            self.backend.clone(),
            self.gemini.clone(),
        ))
    }
}

/// Build the application router: one POST route, permissive CORS, request
/// tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp", post(handle_post))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc_error(Value::Null, -32700, "Parse error".to_string())),
            )
                .into_response();
        }
    };
    let request: JsonRpcRequest = match serde_json::from_value(parsed) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc_error(
                    Value::Null,
                    -32600,
                    "Invalid Request".to_string(),
                )),
            )
                .into_response();
        }
    };

    // Notifications get no response body.
    if request.id.is_none() {
        tracing::debug!(method = %request.method, "notification accepted");
        return StatusCode::ACCEPTED.into_response();
    }

    match state.mode {
        ServerMode::Stateless => {
            let dispatcher = state.fresh_dispatcher();
            let response = dispatcher.handle(&request).await;
            Json(response).into_response()
        }
        ServerMode::Sessions => handle_with_sessions(&state, &headers, &request).await,
    }
}

async fn handle_with_sessions(
    state: &AppState,
    headers: &HeaderMap,
    request: &JsonRpcRequest,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Some(id) = session_id {
        return match state.sessions.get(id) {
            Some(dispatcher) => Json(dispatcher.handle(request).await).into_response(),
            None => session_rejection(request),
        };
    }

    if request.method == "initialize" {
        let dispatcher = Arc::new(state.fresh_dispatcher());
        let session_id = Uuid::new_v4().to_string();
        state.sessions.insert(session_id.clone(), dispatcher.clone());
        tracing::info!(session = %session_id, "session initialized");

        let response = dispatcher.handle(request).await;
        return ([(SESSION_HEADER, session_id)], Json(response)).into_response();
    }

    session_rejection(request)
}

/// The fixed rejection for requests outside a live session.
fn session_rejection(request: &JsonRpcRequest) -> Response {
    let id = request.id.clone().unwrap_or(Value::Null);
    (
        StatusCode::BAD_REQUEST,
        Json(rpc_error(
            id,
            -32000,
            "Bad Request: Server not initialized".to_string(),
        )),
    )
        .into_response()
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
