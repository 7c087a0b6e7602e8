use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{AssumeRoleRequest, AssumedCredentialSet, CallerIdentity};
use crate::invoke::{DynInvocationClient, RemoteError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StsError {
    #[error("access denied: {0}")]
    Denied(String),
    #[error("sts request failed: {0}")]
    Failed(String),
}

/// 安全令牌服务
///
/// `caller_identity` 必须只使用传入的凭证，不能读取任何进程级默认凭证。
#[async_trait]
pub trait StsApi: Send + Sync {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<AssumedCredentialSet, StsError>;

    async fn caller_identity(
        &self,
        credentials: &AssumedCredentialSet,
    ) -> Result<CallerIdentity, StsError>;
}

/// 基于一组凭证构造专属的调用客户端
pub trait RuntimeConnector: Send + Sync {
    fn connect(
        &self,
        account_id: &str,
        credentials: &AssumedCredentialSet,
    ) -> Result<DynInvocationClient, RemoteError>;
}

pub type DynStsApi = Arc<dyn StsApi>;
pub type DynRuntimeConnector = Arc<dyn RuntimeConnector>;
