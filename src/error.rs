use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("agent `{0}` not found")]
    NotFound(String),
    #[error("auth error ({kind}): {message}")]
    Auth {
        kind: AuthErrorKind,
        message: String,
    },
    #[error("invocation error ({kind}): {message}")]
    Invocation {
        kind: InvocationErrorKind,
        message: String,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HubError {
    pub fn auth(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        HubError::Auth {
            kind,
            message: message.into(),
        }
    }

    pub fn invocation(kind: InvocationErrorKind, message: impl Into<String>) -> Self {
        HubError::Invocation {
            kind,
            message: message.into(),
        }
    }

    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            HubError::Auth { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn invocation_kind(&self) -> Option<InvocationErrorKind> {
        match self {
            HubError::Invocation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.invocation_kind() == Some(InvocationErrorKind::Timeout)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    AssumeDenied,
    IsolationFailure,
    IdentityMismatch,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::AssumeDenied => "assume-denied",
            AuthErrorKind::IsolationFailure => "isolation-failure",
            AuthErrorKind::IdentityMismatch => "identity-mismatch",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvocationErrorKind {
    MissingAlias,
    NotFound,
    Timeout,
    DecodeFailure,
    Upstream,
}

impl InvocationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationErrorKind::MissingAlias => "missing-alias",
            InvocationErrorKind::NotFound => "not-found",
            InvocationErrorKind::Timeout => "timeout",
            InvocationErrorKind::DecodeFailure => "decode-failure",
            InvocationErrorKind::Upstream => "upstream",
        }
    }
}

impl fmt::Display for InvocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 注册表加载/校验错误
///
/// 所有字段级错误都带上出错的字段名，便于定位数据问题。
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry record #{index} (agent `{agent_id}`): field `{field}` {reason}")]
    InvalidField {
        index: usize,
        agent_id: String,
        field: &'static str,
        reason: String,
    },
    /// 加载之后才发现的记录问题（例如调度前的复检）
    #[error("agent `{agent_id}`: field `{field}` {reason}")]
    InvalidRecord {
        agent_id: String,
        field: &'static str,
        reason: String,
    },
    #[error("registry record #{index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("duplicate agent_id `{0}` in registry")]
    Duplicate(String),
    #[error("failed to parse registry: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
