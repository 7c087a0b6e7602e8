use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::session::normalize_session_id;
use super::HubState;
use crate::dispatch::{InvocationRequest, PROCESSING_MESSAGE};
use crate::error::{HubError, InvocationErrorKind};
use crate::registry::{AgentRecord, AgentRegistry};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// `{response}` 或 `{error}`，二者不会同时出现
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatResponse {
    pub fn response(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            error: None,
            session_id: Some(session_id.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: None,
            error: Some(message.into()),
            session_id: None,
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ChatResponse::error(message))).into_response()
}

fn status_for(err: &HubError) -> StatusCode {
    match err {
        HubError::NotFound(_) => StatusCode::NOT_FOUND,
        HubError::Auth { .. } => StatusCode::BAD_GATEWAY,
        HubError::Invocation { kind, .. } => match kind {
            InvocationErrorKind::MissingAlias => StatusCode::INTERNAL_SERVER_ERROR,
            InvocationErrorKind::Timeout => StatusCode::ACCEPTED,
            _ => StatusCode::BAD_GATEWAY,
        },
        HubError::Registry(_) | HubError::Config(_) | HubError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 选目标 agent：请求显式指定 > 配置的默认 agent > 注册表里唯一启用的 agent
fn select_agent<'r>(
    registry: &'r AgentRegistry,
    requested: Option<&str>,
    default_agent_id: Option<&str>,
) -> Result<&'r AgentRecord, Response> {
    let agent_id = match requested.or(default_agent_id) {
        Some(id) => id,
        None => {
            let mut enabled = registry.enabled();
            return match (enabled.next(), enabled.next()) {
                (Some(only), None) => Ok(only),
                (None, _) => Err(error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "No agents registered",
                )),
                _ => Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "agent_id is required; available: {}",
                        registry.enabled_ids().join(", ")
                    ),
                )),
            };
        }
    };

    registry.resolve(agent_id).map_err(|err| {
        error_response(
            status_for(&err),
            format!(
                "{}. Available: {}",
                err,
                registry.enabled_ids().join(", ")
            ),
        )
    })
}

pub async fn chat(State(state): State<Arc<HubState>>, Json(body): Json<ChatRequest>) -> Response {
    if body.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No prompt provided");
    }

    let session_id = normalize_session_id(body.session_id.as_deref());
    let registry = state.registry.snapshot();
    let record = match select_agent(
        &registry,
        body.agent_id.as_deref(),
        state.default_agent_id.as_deref(),
    ) {
        Ok(record) => record,
        Err(response) => return response,
    };

    let request = InvocationRequest::new(record, body.prompt, session_id.clone());
    match state
        .dispatcher
        .dispatch(&request, Some(state.chat_timeout))
        .await
    {
        Ok(reply) => (
            StatusCode::OK,
            Json(ChatResponse::response(reply.into_display_text(), session_id)),
        )
            .into_response(),
        Err(err) if err.is_timeout() => (
            StatusCode::ACCEPTED,
            Json(ChatResponse::response(PROCESSING_MESSAGE, session_id)),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(agent_id = record.agent_id(), error = %err, "chat dispatch failed");
            error_response(status_for(&err), err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgentsResponse<'a> {
    pub agents: Vec<&'a AgentRecord>,
}

pub async fn list_agents(State(state): State<Arc<HubState>>) -> Response {
    let registry = state.registry.snapshot();
    Json(AgentsResponse {
        agents: registry.enabled().collect(),
    })
    .into_response()
}

pub async fn refresh_agents(State(state): State<Arc<HubState>>) -> Response {
    match state.registry.refresh().await {
        Ok(count) => Json(serde_json::json!({
            "status": "refreshed",
            "agents_loaded": count,
        }))
        .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

pub async fn health(State(state): State<Arc<HubState>>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "agents_loaded": state.registry.snapshot().enabled_count(),
    }))
    .into_response()
}
