//! HTTP host for the agent runtime
//!
//! - `POST /invocations` takes `{"prompt": ..., "session_id"?: ...}` and answers with the
//!   agent's plain text (or the JSON error object). A body that is not JSON is treated like a
//!   payload without a prompt.
//! - `GET /ping` answers `{"status":"Healthy"}` without touching the agent, so health checks
//!   succeed before the first invocation builds it.

#![warn(clippy::all, rust_2018_idioms)]

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::agent_framework::AgentRuntime;

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/invocations", post(handle_invocation))
        .route("/ping", get(handle_ping))
        .with_state(runtime)
        .layer(TraceLayer::new_for_http())
}

async fn handle_invocation(State(runtime): State<Arc<AgentRuntime>>, body: Bytes) -> String {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or_else(|e| {
        warn!("Invocation body is not valid JSON: {}", e);
        Value::Object(Default::default())
    });
    runtime.handle_payload(&payload).await
}

async fn handle_ping() -> Json<Value> {
    Json(json!({"status": "Healthy"}))
}

/// Serve until interrupted (Ctrl-C)
pub async fn serve(runtime: Arc<AgentRuntime>, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Agent server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(runtime))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
