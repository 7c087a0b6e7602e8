use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use super::sts::{DynRuntimeConnector, DynStsApi, StsError};
use super::types::{AssumedCredentialSet, CrossAccountRole};
use crate::error::{AuthErrorKind, HubError, Result};
use crate::invoke::DynInvocationClient;

/// 一次跨账户凭证获取的结果：目标账户、临时凭证、以及只绑定这组凭证的客户端
#[derive(Clone)]
pub struct CredentialLease {
    account_id: String,
    credentials: AssumedCredentialSet,
    client: DynInvocationClient,
}

impl CredentialLease {
    pub fn new(
        account_id: impl Into<String>,
        credentials: AssumedCredentialSet,
        client: DynInvocationClient,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            credentials,
            client,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.credentials.expires_at
    }

    pub fn credentials(&self) -> &AssumedCredentialSet {
        &self.credentials
    }

    pub fn client(&self) -> &DynInvocationClient {
        &self.client
    }

    pub fn into_client(self) -> DynInvocationClient {
        self.client
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.credentials.is_usable_at(now, margin)
    }
}

impl fmt::Debug for CredentialLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialLease")
            .field("account_id", &self.account_id)
            .field("client", &self.client.client_id())
            .field("expires_at", &self.credentials.expires_at)
            .finish()
    }
}

/// 跨账户凭证来源，调度器只依赖这个 trait
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self, target_account_id: &str) -> Result<CredentialLease>;
}

/// 凭证代理
///
/// 每次 `acquire` 都重新 assume role，并用新凭证校验身份。不做重试，不做缓存；
/// 需要复用时在外层套 [`super::LeaseCache`]。
pub struct CredentialBroker {
    local_account_id: String,
    role: CrossAccountRole,
    sts: DynStsApi,
    connector: DynRuntimeConnector,
}

impl CredentialBroker {
    pub fn new(
        local_account_id: impl Into<String>,
        role: CrossAccountRole,
        sts: DynStsApi,
        connector: DynRuntimeConnector,
    ) -> Self {
        Self {
            local_account_id: local_account_id.into(),
            role,
            sts,
            connector,
        }
    }
}

#[async_trait]
impl CredentialSource for CredentialBroker {
    #[instrument(skip(self), fields(local_account = %self.local_account_id))]
    async fn acquire(&self, target_account_id: &str) -> Result<CredentialLease> {
        if target_account_id == self.local_account_id {
            return Err(HubError::Config(format!(
                "account {} is the local account; it is invoked without cross-account credentials",
                target_account_id
            )));
        }

        let request = self.role.request_for(target_account_id);
        tracing::info!(role_arn = %request.role_arn, "assuming cross-account role");

        let credentials = self.sts.assume_role(&request).await.map_err(|err| match err {
            StsError::Denied(message) => HubError::auth(
                AuthErrorKind::AssumeDenied,
                format!("assume role {} rejected: {}", request.role_arn, message),
            ),
            StsError::Failed(message) => HubError::Other(anyhow::anyhow!(
                "assume role {} failed: {}",
                request.role_arn,
                message
            )),
        })?;

        let client = self
            .connector
            .connect(target_account_id, &credentials)
            .map_err(|err| HubError::Other(anyhow::anyhow!("failed to build client: {}", err)))?;

        let identity = self
            .sts
            .caller_identity(&credentials)
            .await
            .map_err(|err| {
                HubError::auth(
                    AuthErrorKind::IdentityMismatch,
                    format!("could not verify assumed identity: {}", err),
                )
            })?;

        if identity.account == self.local_account_id {
            tracing::error!(
                target_account = target_account_id,
                "assumed credentials resolved to the local account"
            );
            return Err(HubError::auth(
                AuthErrorKind::IsolationFailure,
                format!(
                    "expected account {}, but credentials resolved to local account {}",
                    target_account_id, identity.account
                ),
            ));
        }
        if identity.account != target_account_id {
            return Err(HubError::auth(
                AuthErrorKind::IdentityMismatch,
                format!(
                    "expected account {}, got {}",
                    target_account_id, identity.account
                ),
            ));
        }

        tracing::info!(
            account = %identity.account,
            client = client.client_id(),
            expires_at = %credentials.expires_at,
            "cross-account identity verified"
        );
        Ok(CredentialLease::new(target_account_id, credentials, client))
    }
}

/// 未配置跨账户能力时使用：任何跨账户请求都直接报配置错误
pub struct UnavailableCredentialSource;

#[async_trait]
impl CredentialSource for UnavailableCredentialSource {
    async fn acquire(&self, target_account_id: &str) -> Result<CredentialLease> {
        Err(HubError::Config(format!(
            "cross-account invocation for account {} is not configured",
            target_account_id
        )))
    }
}
