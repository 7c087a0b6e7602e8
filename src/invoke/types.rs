use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{HubError, InvocationErrorKind};
use crate::registry::{AgentType, DEFAULT_ACTOR_ID};

/// 远端 agent 调用参数
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentInvocation {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub input_text: String,
    #[serde(default)]
    pub agent_type: AgentType,
    /// 仅 AgentCore 使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_runtime_arn: Option<String>,
    #[serde(default = "default_actor_id")]
    pub actor_id: String,
}

fn default_actor_id() -> String {
    DEFAULT_ACTOR_ID.to_string()
}

/// 远端返回的分片流：有限、不可重放，由远端结束
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, RemoteError>> + Send>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteErrorKind {
    ResourceNotFound,
    ExpiredToken,
    Validation,
    AccessDenied,
    Throttling,
    Transport,
    Other,
}

impl RemoteErrorKind {
    /// 按远端错误码归类，兼容 `ResourceNotFoundException` / `ResourceNotFound` 等写法
    pub fn from_code(code: &str) -> Self {
        if code.contains("ResourceNotFound") {
            RemoteErrorKind::ResourceNotFound
        } else if code.contains("ExpiredToken") {
            RemoteErrorKind::ExpiredToken
        } else if code.contains("Validation") {
            RemoteErrorKind::Validation
        } else if code.contains("AccessDenied") {
            RemoteErrorKind::AccessDenied
        } else if code.contains("Throttling") {
            RemoteErrorKind::Throttling
        } else {
            RemoteErrorKind::Other
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            kind: RemoteErrorKind::from_code(&code),
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Transport,
            code: "TransportError".to_string(),
            message: message.into(),
        }
    }
}

impl From<RemoteError> for HubError {
    fn from(err: RemoteError) -> Self {
        let kind = match err.kind {
            RemoteErrorKind::ResourceNotFound => InvocationErrorKind::NotFound,
            _ => InvocationErrorKind::Upstream,
        };
        HubError::invocation(kind, err.to_string())
    }
}

/// 一次调度的结果文本
///
/// `NoResponse` 表示远端一个分片都没有返回，与返回了空字符串的 `Text("")` 区分开。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentReply {
    Text(String),
    NoResponse,
}

impl AgentReply {
    pub const NO_RESPONSE_TEXT: &'static str = "No response from agent.";

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AgentReply::Text(text) => Some(text),
            AgentReply::NoResponse => None,
        }
    }

    pub fn into_display_text(self) -> String {
        match self {
            AgentReply::Text(text) => text,
            AgentReply::NoResponse => Self::NO_RESPONSE_TEXT.to_string(),
        }
    }
}
