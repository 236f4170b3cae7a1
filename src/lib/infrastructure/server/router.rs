use super::error::ServerError;
use crate::rpc::McpService;
use crate::rpc::types::RpcResponse;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const SESSION_HEADER: &str = "mcp-session-id";

pub(crate) fn build_router(service: Arc<McpService>, path: &str) -> Router {
    Router::new()
        .route(path, post(handle_post).get(method_not_allowed))
        .with_state(service)
}

pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    info!(%addr, "Binding HTTP transport");
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serves MCP over HTTP until `shutdown` fires, then drains open connections.
pub async fn serve_listener(
    listener: TcpListener,
    service: Arc<McpService>,
    path: &str,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = build_router(service, path);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, path, "HTTP transport ready to accept connections");
    }

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ServerError::Serve)
}

async fn handle_post(State(service): State<Arc<McpService>>, body: String) -> Response {
    let request = match McpService::parse_request(&body) {
        Ok(request) => request,
        Err(response) => {
            warn!("Rejected malformed JSON-RPC body");
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let opens_session = request.method == "initialize";
    match service.handle(request).await {
        Some(response) => with_session(response, opens_session),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

fn with_session(response: RpcResponse, opens_session: bool) -> Response {
    let mut http = Json(response).into_response();
    if opens_session {
        let session_id = uuid::Uuid::new_v4().to_string();
        debug!(%session_id, "Issuing MCP session id");
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            http.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    http
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
