use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use super::request::{InvocationRequest, Route};
use crate::credentials::CredentialSource;
use crate::error::{HubError, InvocationErrorKind, RegistryError, Result};
use crate::invoke::{
    assemble_reply, normalize_agentcore_body, AgentInvocation, AgentReply, DynInvocationClient,
};
use crate::registry::{AgentRecord, AgentType};
use crate::utils::IdentifierValidator;

/// 调度器：选客户端、调用、拼接结果
///
/// 本地客户端和凭证来源都由构造方注入；调度器本身不持有可变状态，
/// 可以在多个并发请求间共享。
pub struct Dispatcher {
    local_account_id: String,
    local_client: DynInvocationClient,
    credentials: Arc<dyn CredentialSource>,
}

impl Dispatcher {
    pub fn new(
        local_account_id: impl Into<String>,
        local_client: DynInvocationClient,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            local_account_id: local_account_id.into(),
            local_client,
            credentials,
        }
    }

    pub fn route_for<'r>(&self, record: &'r AgentRecord) -> Route<'r> {
        match record.account_id() {
            Some(account) if record.is_cross_account(&self.local_account_id) => {
                Route::CrossAccount(account)
            }
            _ => Route::Local,
        }
    }

    /// 按路由取得本次调用要使用的客户端
    ///
    /// 返回值就是后续调用唯一使用的客户端；跨账户时每次调度只 acquire 一次。
    async fn client_for(&self, route: &Route<'_>) -> Result<DynInvocationClient> {
        match route {
            Route::Local => Ok(self.local_client.clone()),
            Route::CrossAccount(account) => {
                let lease = self.credentials.acquire(account).await?;
                Ok(lease.into_client())
            }
        }
    }

    #[instrument(
        skip(self, request),
        fields(agent_id = %request.record.agent_id(), session_id = %request.session_id)
    )]
    pub async fn dispatch(
        &self,
        request: &InvocationRequest<'_>,
        deadline: Option<Duration>,
    ) -> Result<AgentReply> {
        check_invocable(request.record)?;

        let work = self.invoke(request);
        match deadline {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(deadline_ms = limit.as_millis() as u64, "agent invocation timed out");
                    Err(HubError::invocation(
                        InvocationErrorKind::Timeout,
                        format!("no complete response within {:?}", limit),
                    ))
                }
            },
            None => work.await,
        }
    }

    async fn invoke(&self, request: &InvocationRequest<'_>) -> Result<AgentReply> {
        let record = request.record;
        let route = self.route_for(record);
        let client = self.client_for(&route).await?;

        tracing::info!(
            agent_type = record.agent_type().as_str(),
            client = client.client_id(),
            route = ?route,
            "routing request to agent"
        );

        let invocation = AgentInvocation {
            agent_id: record.agent_id().to_string(),
            agent_alias_id: record.alias_id().to_string(),
            session_id: request.session_id.clone(),
            input_text: request.user_text.clone(),
            agent_type: record.agent_type(),
            agent_runtime_arn: record.agent_runtime_arn().map(str::to_string),
            actor_id: record.actor_id().to_string(),
        };

        let stream = client.invoke_agent(invocation).await.map_err(|err| {
            tracing::error!(client = client.client_id(), error = %err, "agent invocation failed");
            HubError::from(err)
        })?;
        let reply = assemble_reply(stream).await?;

        Ok(match (record.agent_type(), reply) {
            (AgentType::AgentCore, AgentReply::Text(body)) => {
                AgentReply::Text(normalize_agentcore_body(&body))
            }
            (_, reply) => reply,
        })
    }
}

/// 发送前的最后检查：别名缺失直接拒绝，标识符必须能安全地作为路径段
pub fn check_invocable(record: &AgentRecord) -> Result<()> {
    if record.alias_id().is_empty() {
        return Err(HubError::invocation(
            InvocationErrorKind::MissingAlias,
            format!("agent `{}` has no alias_id", record.agent_id()),
        ));
    }
    for (field, value) in [("agent_id", record.agent_id()), ("alias_id", record.alias_id())] {
        IdentifierValidator::validate_path_segment(value).map_err(|reason| {
            HubError::Registry(RegistryError::InvalidRecord {
                agent_id: record.agent_id().to_string(),
                field,
                reason,
            })
        })?;
    }
    Ok(())
}
