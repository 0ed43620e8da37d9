//! HTTP Host Tests
//!
//! Exercises the router in-process with `tower::ServiceExt::oneshot`: the invocation payload
//! contract, the health check, and lazy agent setup through [`AgentRuntime`].

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use ambient_monitor::app::agent_framework::{
    AgentFactory, AgentRuntime, MonitoringAgent, PolicyDecision, TurnRole,
};
use ambient_monitor::app::config::SessionSettings;
use ambient_monitor::app::server::router;
use common::{agent_with, EchoPolicy, FakeBackend, ScriptedPolicy, SharedFake};

fn echo_agent() -> MonitoringAgent {
    agent_with(
        Arc::new(EchoPolicy {
            delay: Duration::ZERO,
        }),
        SharedFake::new(FakeBackend::new()).catalog(1000),
        SessionSettings::default(),
    )
}

async fn send(runtime: Arc<AgentRuntime>, request: Request<Body>) -> (StatusCode, String) {
    let response = router(runtime).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn invocation(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/invocations")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

/// Fails the first build, then succeeds
struct FlakyFactory {
    builds: AtomicUsize,
}

#[async_trait]
impl AgentFactory for FlakyFactory {
    async fn build(&self) -> anyhow::Result<MonitoringAgent> {
        if self.builds.fetch_add(1, Ordering::SeqCst) == 0 {
            anyhow::bail!("Failed to read system prompt from config/system_prompt.txt");
        }
        Ok(echo_agent())
    }
}

#[tokio::test]
async fn test_ping_is_healthy_before_setup() {
    let runtime = Arc::new(AgentRuntime::new(Box::new(FlakyFactory {
        builds: AtomicUsize::new(0),
    })));
    let request = Request::builder().uri("/ping").body(Body::empty()).unwrap();

    let (status, body) = send(runtime.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "Healthy"}));
    assert!(!runtime.is_ready());
}

#[tokio::test]
async fn test_missing_prompt_is_exact_error_text() {
    let runtime = Arc::new(AgentRuntime::with_agent(echo_agent()));

    let (status, body) = send(runtime.clone(), invocation(r#"{"session_id": "ops"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error": "No 'prompt' field found in payload"}"#);

    let (_, empty_prompt) = send(runtime, invocation(r#"{"prompt": ""}"#)).await;
    assert_eq!(empty_prompt, body);
}

#[tokio::test]
async fn test_invalid_json_is_treated_as_missing_prompt() {
    let runtime = Arc::new(AgentRuntime::with_agent(echo_agent()));
    let (_, body) = send(runtime, invocation("prompt=hello")).await;
    assert_eq!(body, r#"{"error": "No 'prompt' field found in payload"}"#);
}

#[tokio::test]
async fn test_prompt_returns_plain_text_on_default_session() {
    let runtime = Arc::new(AgentRuntime::with_agent(echo_agent()));

    let (status, body) = send(runtime.clone(), invocation(r#"{"prompt": "Any alarms?"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "echo: Any alarms?");

    let agent = runtime.agent().await.unwrap();
    let turns = agent.memory().get("default-session").await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role, TurnRole::Assistant);
}

#[tokio::test]
async fn test_session_id_selects_thread() {
    let runtime = Arc::new(AgentRuntime::with_agent(echo_agent()));
    send(
        runtime.clone(),
        invocation(r#"{"prompt": "first", "session_id": "scheduled-20260501-1200"}"#),
    )
    .await;

    let agent = runtime.agent().await.unwrap();
    assert_eq!(agent.memory().get("scheduled-20260501-1200").await.len(), 2);
    assert!(agent.memory().get("default-session").await.is_empty());
}

#[tokio::test]
async fn test_non_string_session_id_is_rejected() {
    let runtime = Arc::new(AgentRuntime::with_agent(echo_agent()));

    let (status, body) = send(
        runtime.clone(),
        invocation(r#"{"prompt": "hi", "session_id": 42}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"{"error": "Error processing request: session_id must be a string"}"#
    );

    let agent = runtime.agent().await.unwrap();
    assert!(agent.memory().get("default-session").await.is_empty());
    assert!(agent.memory().get("42").await.is_empty());

    // null is the same as leaving it out
    let (_, body) = send(runtime, invocation(r#"{"prompt": "hi", "session_id": null}"#)).await;
    assert_eq!(body, "echo: hi");
    assert_eq!(agent.memory().get("default-session").await.len(), 2);
}

#[tokio::test]
async fn test_empty_agent_answer_carries_raw_result() {
    let policy = Arc::new(ScriptedPolicy::new(vec![Ok(PolicyDecision::answer(""))]));
    let agent = agent_with(
        policy,
        SharedFake::new(FakeBackend::new()).catalog(1000),
        SessionSettings::default(),
    );
    let runtime = Arc::new(AgentRuntime::with_agent(agent));

    let (_, body) = send(runtime, invocation(r#"{"prompt": "hi"}"#)).await;
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "No valid response from agent");
    assert!(parsed.get("raw_result").is_some());
}

#[tokio::test]
async fn test_failed_setup_is_reported_and_retried() {
    let runtime = Arc::new(AgentRuntime::new(Box::new(FlakyFactory {
        builds: AtomicUsize::new(0),
    })));

    let (_, first) = send(runtime.clone(), invocation(r#"{"prompt": "hi"}"#)).await;
    let parsed: Value = serde_json::from_str(&first).unwrap();
    assert!(parsed["error"]
        .as_str()
        .unwrap()
        .starts_with("Error processing request: Failed to read system prompt"));
    assert!(!runtime.is_ready());

    let (_, second) = send(runtime.clone(), invocation(r#"{"prompt": "hi"}"#)).await;
    assert_eq!(second, "echo: hi");
    assert!(runtime.is_ready());
}
