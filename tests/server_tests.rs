use std::sync::Arc;
use std::time::Duration;

use agenthub::server::ChatResponse;
use agenthub::{
    build_router, AgentInvocation, AgentRegistry, ChunkStream, Dispatcher, EchoInvocationClient,
    HubState, InvocationClient, RegistryHandle, RemoteError, StaticRegistrySource,
    UnavailableCredentialSource, PROCESSING_MESSAGE,
};
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;

const API_KEY: &str = "test-key-123";

const REGISTRY_JSON: &str = r#"[
  {"agent_id": "ECHOAGENT1", "alias_id": "ALIAS00001", "name": "Echo"},
  {"agent_id": "SLOWAGENT1", "alias_id": "ALIAS00002", "name": "Slow"},
  {"agent_id": "OFFAGENT01", "alias_id": "ALIAS00003", "enabled": false}
]"#;

/// ECHOAGENT1 正常回显，SLOWAGENT1 永不返回
struct ScriptedClient {
    echo: EchoInvocationClient,
}

#[async_trait]
impl InvocationClient for ScriptedClient {
    fn client_id(&self) -> &str {
        "local"
    }

    async fn invoke_agent(&self, invocation: AgentInvocation) -> Result<ChunkStream, RemoteError> {
        if invocation.agent_id == "SLOWAGENT1" {
            return Ok(Box::pin(futures::stream::pending::<Result<Vec<u8>, RemoteError>>()));
        }
        self.echo.invoke_agent(invocation).await
    }
}

async fn test_server_with(registry_json: &str, default_agent_id: Option<&str>) -> TestServer {
    let registry = AgentRegistry::from_json_str(registry_json).expect("registry");
    let handle = RegistryHandle::load(Arc::new(StaticRegistrySource::new(registry)))
        .await
        .expect("load registry");
    let state = Arc::new(HubState {
        registry: handle,
        dispatcher: Dispatcher::new(
            "843074507558",
            Arc::new(ScriptedClient {
                echo: EchoInvocationClient::default(),
            }),
            Arc::new(UnavailableCredentialSource),
        ),
        api_key: Some(API_KEY.to_string()),
        chat_timeout: Duration::from_millis(100),
        default_agent_id: default_agent_id.map(str::to_string),
    });
    TestServer::new(build_router(state)).expect("failed to create test server")
}

async fn test_server() -> TestServer {
    test_server_with(REGISTRY_JSON, None).await
}

fn api_key_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(API_KEY),
    )
}

#[tokio::test]
async fn health_needs_no_key() {
    let server = test_server().await;
    let resp = server.get("/health").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["agents_loaded"], 2);
}

#[tokio::test]
async fn chat_without_key_is_unauthorized() {
    let server = test_server().await;
    let resp = server
        .post("/chat")
        .json(&json!({"prompt": "hi", "agent_id": "ECHOAGENT1"}))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    let body: ChatResponse = resp.json();
    assert_eq!(body.error.as_deref(), Some("unauthorized"));
}

#[tokio::test]
async fn chat_with_wrong_key_is_unauthorized() {
    let server = test_server().await;
    let resp = server
        .post("/chat")
        .add_header(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("nope"),
        )
        .json(&json!({"prompt": "hi", "agent_id": "ECHOAGENT1"}))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_returns_agent_reply_and_padded_session() {
    let server = test_server().await;
    let (name, value) = api_key_header();
    let resp = server
        .post("/chat")
        .add_header(name, value)
        .json(&json!({"prompt": "hello there", "agent_id": "ECHOAGENT1", "session_id": "abc"}))
        .await;
    resp.assert_status_ok();

    let body: ChatResponse = resp.json();
    assert_eq!(body.response.as_deref(), Some("[Echo ECHOAGENT1] hello there"));
    assert!(body.error.is_none());
    let session_id = body.session_id.expect("session id");
    assert_eq!(session_id.len(), 33);
    assert!(session_id.starts_with("abc-"));
}

#[tokio::test]
async fn slow_agent_reports_still_processing() {
    let server = test_server().await;
    let (name, value) = api_key_header();
    let resp = server
        .post("/chat")
        .add_header(name, value)
        .json(&json!({"prompt": "take your time", "agent_id": "SLOWAGENT1"}))
        .await;
    resp.assert_status(StatusCode::ACCEPTED);

    let body: ChatResponse = resp.json();
    assert_eq!(body.response.as_deref(), Some(PROCESSING_MESSAGE));
}

#[tokio::test]
async fn empty_prompt_is_bad_request() {
    let server = test_server().await;
    let (name, value) = api_key_header();
    let resp = server
        .post("/chat")
        .add_header(name, value)
        .json(&json!({"prompt": "   ", "agent_id": "ECHOAGENT1"}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: ChatResponse = resp.json();
    assert_eq!(body.error.as_deref(), Some("No prompt provided"));
}

#[tokio::test]
async fn unknown_or_disabled_agent_is_not_found() {
    let server = test_server().await;
    for agent_id in ["MISSING001", "OFFAGENT01"] {
        let (name, value) = api_key_header();
        let resp = server
            .post("/chat")
            .add_header(name, value)
            .json(&json!({"prompt": "hi", "agent_id": agent_id}))
            .await;
        resp.assert_status(StatusCode::NOT_FOUND);

        let body: ChatResponse = resp.json();
        let error = body.error.expect("error message");
        assert!(error.contains(agent_id));
        assert!(error.contains("ECHOAGENT1"));
    }
}

#[tokio::test]
async fn agent_id_required_when_ambiguous() {
    let server = test_server().await;
    let (name, value) = api_key_header();
    let resp = server
        .post("/chat")
        .add_header(name, value)
        .json(&json!({"prompt": "hi"}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn default_agent_used_when_request_names_none() {
    let server = test_server_with(REGISTRY_JSON, Some("ECHOAGENT1")).await;
    let (name, value) = api_key_header();
    let resp = server
        .post("/chat")
        .add_header(name, value)
        .json(&json!({"prompt": "hi"}))
        .await;
    resp.assert_status_ok();

    let body: ChatResponse = resp.json();
    assert_eq!(body.response.as_deref(), Some("[Echo ECHOAGENT1] hi"));
}

#[tokio::test]
async fn cross_account_agent_without_broker_is_server_error() {
    let server = test_server_with(
        r#"[{"agent_id": "W4KUBC2B6A", "alias_id": "IO1GTTHP0M", "account_id": "152864141302"}]"#,
        None,
    )
    .await;
    let (name, value) = api_key_header();
    let resp = server
        .post("/chat")
        .add_header(name, value)
        .json(&json!({"prompt": "hi"}))
        .await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn agents_endpoint_lists_enabled_records() {
    let server = test_server().await;
    let (name, value) = api_key_header();
    let resp = server.get("/agents").add_header(name, value).await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    let agents = body["agents"].as_array().expect("agents array");
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0]["agent_id"], "ECHOAGENT1");
    assert_eq!(agents[1]["agent_id"], "SLOWAGENT1");
}

#[tokio::test]
async fn refresh_reloads_from_source() {
    let server = test_server().await;
    let (name, value) = api_key_header();
    let resp = server.post("/agents/refresh").add_header(name, value).await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "refreshed");
    assert_eq!(body["agents_loaded"], 2);
}
