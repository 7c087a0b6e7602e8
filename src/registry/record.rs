use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::utils::IdentifierValidator;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AgentType {
    #[default]
    #[serde(rename = "bedrock_agent")]
    BedrockAgent,
    #[serde(rename = "agentcore")]
    AgentCore,
}

impl AgentType {
    /// `bedrock` is the legacy spelling still present in older registry rows.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bedrock_agent" | "bedrock" => Some(AgentType::BedrockAgent),
            "agentcore" => Some(AgentType::AgentCore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::BedrockAgent => "bedrock_agent",
            AgentType::AgentCore => "agentcore",
        }
    }
}

/// AgentCore 记录未指定 `actor_id` 时使用
pub const DEFAULT_ACTOR_ID: &str = "hub-agent";

/// 已校验的 agent 注册记录
///
/// 只能通过 [`AgentRecordBuilder::build`] 或注册表加载得到，字段只读。
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AgentRecord {
    agent_id: String,
    alias_id: String,
    agent_type: AgentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    /// AgentCore 运行时 ARN，`agentcore` 类型必填
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_runtime_arn: Option<String>,
    actor_id: String,
    capabilities: Vec<String>,
    domains: Vec<String>,
    example_queries: Vec<String>,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl AgentRecord {
    pub fn builder(
        agent_id: impl Into<String>,
        alias_id: impl Into<String>,
    ) -> AgentRecordBuilder {
        AgentRecordBuilder::new(agent_id, alias_id)
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn alias_id(&self) -> &str {
        &self.alias_id
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn agent_runtime_arn(&self) -> Option<&str> {
        self.agent_runtime_arn.as_deref()
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn example_queries(&self) -> &[String] {
        &self.example_queries
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    /// 判断是否需要跨账户调用：account_id 存在且与本地账户不同
    pub fn is_cross_account(&self, local_account_id: &str) -> bool {
        matches!(self.account_id(), Some(account) if account != local_account_id)
    }

    #[cfg(test)]
    pub(crate) fn with_alias_unchecked(mut self, alias_id: &str) -> Self {
        self.alias_id = alias_id.to_string();
        self
    }
}

pub struct AgentRecordBuilder {
    record: AgentRecord,
}

impl AgentRecordBuilder {
    pub fn new(agent_id: impl Into<String>, alias_id: impl Into<String>) -> Self {
        Self {
            record: AgentRecord {
                agent_id: agent_id.into(),
                alias_id: alias_id.into(),
                agent_type: AgentType::default(),
                account_id: None,
                agent_runtime_arn: None,
                actor_id: DEFAULT_ACTOR_ID.to_string(),
                capabilities: Vec::new(),
                domains: Vec::new(),
                example_queries: Vec::new(),
                enabled: true,
                name: None,
                description: None,
            },
        }
    }

    pub fn agent_type(mut self, agent_type: AgentType) -> Self {
        self.record.agent_type = agent_type;
        self
    }

    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.record.account_id = Some(account_id.into());
        self
    }

    pub fn agent_runtime_arn(mut self, arn: impl Into<String>) -> Self {
        self.record.agent_runtime_arn = Some(arn.into());
        self
    }

    pub fn actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.record.actor_id = actor_id.into();
        self
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.record.capabilities.push(capability.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.record.domains.push(domain.into());
        self
    }

    pub fn example_query(mut self, query: impl Into<String>) -> Self {
        self.record.example_queries.push(query.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.record.enabled = enabled;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.record.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<AgentRecord, RegistryError> {
        self.build_at(0)
    }

    pub(crate) fn build_at(self, index: usize) -> Result<AgentRecord, RegistryError> {
        let record = self.record;
        let invalid = |field: &'static str, reason: String| RegistryError::InvalidField {
            index,
            agent_id: record.agent_id.clone(),
            field,
            reason,
        };

        IdentifierValidator::validate_path_segment(&record.agent_id)
            .map_err(|reason| invalid("agent_id", reason))?;
        IdentifierValidator::validate_path_segment(&record.alias_id)
            .map_err(|reason| invalid("alias_id", reason))?;
        if let Some(account_id) = &record.account_id {
            IdentifierValidator::validate_account_id(account_id)
                .map_err(|reason| invalid("account_id", reason))?;
        }
        IdentifierValidator::validate_identifier(&record.actor_id)
            .map_err(|reason| invalid("actor_id", reason))?;
        match (&record.agent_runtime_arn, record.agent_type) {
            (Some(arn), _) => {
                IdentifierValidator::validate_identifier(arn)
                    .map_err(|reason| invalid("agent_runtime_arn", reason))?;
                if !arn.starts_with("arn:") {
                    return Err(invalid(
                        "agent_runtime_arn",
                        format!("must be an ARN, got {:?}", arn),
                    ));
                }
            }
            (None, AgentType::AgentCore) => {
                return Err(invalid(
                    "agent_runtime_arn",
                    "is required for agentcore agents".to_string(),
                ));
            }
            (None, AgentType::BedrockAgent) => {}
        }

        Ok(record)
    }
}
