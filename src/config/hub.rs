use std::path::PathBuf;
use std::time::Duration;

use super::env::EnvConfig;
use crate::credentials::{CrossAccountRole, DEFAULT_ROLE_ARN_TEMPLATE};
use crate::error::{HubError, Result};
use crate::utils::IdentifierValidator;

pub const DEFAULT_REGISTRY_PATH: &str = "agents.json";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 120;

/// Hub 运行配置
///
/// 环境变量：
/// - `HUB_LOCAL_ACCOUNT_ID`：本地账户（必填）
/// - `HUB_CROSS_ACCOUNT_ROLE_ARN`：角色 ARN 模板，可含 `{account_id}`
/// - `HUB_CROSS_ACCOUNT_ROLE_OVERRIDES`：`账户=ARN` 逗号分隔
/// - `HUB_CROSS_ACCOUNT_EXTERNAL_ID`：外部 ID
/// - `AGENT_REGISTRY_PATH`：注册表 JSON 路径
/// - `HUB_API_KEY`：聊天接口 API Key，支持 `${VAR}`
/// - `HUB_BIND`、`HUB_CHAT_TIMEOUT_SECS`、`HUB_DEFAULT_AGENT_ID`
/// - `HUB_GATEWAY_URL`：调用网关，必须是 https（回环地址除外）
#[derive(Clone, Debug)]
pub struct HubConfig {
    pub local_account_id: String,
    pub role: CrossAccountRole,
    pub registry_path: PathBuf,
    pub api_key: Option<String>,
    pub bind: String,
    pub chat_timeout: Duration,
    pub default_agent_id: Option<String>,
    pub gateway_url: Option<String>,
}

impl HubConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| EnvConfig::get_env_optional(key))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let local_account_id = lookup("HUB_LOCAL_ACCOUNT_ID").ok_or_else(|| {
            HubError::Config("`HUB_LOCAL_ACCOUNT_ID` is required".to_string())
        })?;

        let mut role = CrossAccountRole::new(
            lookup("HUB_CROSS_ACCOUNT_ROLE_ARN")
                .unwrap_or_else(|| DEFAULT_ROLE_ARN_TEMPLATE.to_string()),
        );
        role.external_id = lookup("HUB_CROSS_ACCOUNT_EXTERNAL_ID");
        if let Some(raw) = lookup("HUB_CROSS_ACCOUNT_ROLE_OVERRIDES") {
            role.overrides = parse_overrides(&raw)?;
        }

        let api_key = match lookup("HUB_API_KEY") {
            Some(raw) => Some(EnvConfig::resolve_secret_with(&raw, "HUB_API_KEY", &lookup)?),
            None => None,
        };

        let chat_timeout = match lookup("HUB_CHAT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                HubError::Config(format!("`HUB_CHAT_TIMEOUT_SECS` must be an integer, got {:?}", raw))
            })?),
            None => Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS),
        };

        let config = Self {
            local_account_id,
            role,
            registry_path: lookup("AGENT_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH)),
            api_key,
            bind: lookup("HUB_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            chat_timeout,
            default_agent_id: lookup("HUB_DEFAULT_AGENT_ID"),
            gateway_url: lookup("HUB_GATEWAY_URL"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let config_err = |field: &str, reason: String| {
            HubError::Config(format!("`{}` {}", field, reason))
        };

        IdentifierValidator::validate_account_id(&self.local_account_id)
            .map_err(|r| config_err("HUB_LOCAL_ACCOUNT_ID", r))?;
        for account in self.role.overrides.keys() {
            IdentifierValidator::validate_account_id(account)
                .map_err(|r| config_err("HUB_CROSS_ACCOUNT_ROLE_OVERRIDES", r))?;
        }
        if let Some(external_id) = &self.role.external_id {
            IdentifierValidator::validate_identifier(external_id)
                .map_err(|r| config_err("HUB_CROSS_ACCOUNT_EXTERNAL_ID", r))?;
        }
        if let Some(key) = &self.api_key {
            IdentifierValidator::validate_api_key(key).map_err(|r| config_err("HUB_API_KEY", r))?;
        }
        if let Some(url) = &self.gateway_url {
            IdentifierValidator::validate_url(url).map_err(|r| config_err("HUB_GATEWAY_URL", r))?;
        }
        if self.chat_timeout.is_zero() {
            return Err(config_err("HUB_CHAT_TIMEOUT_SECS", "must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_overrides(raw: &str) -> Result<std::collections::HashMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(account, arn)| (account.trim().to_string(), arn.trim().to_string()))
                .ok_or_else(|| {
                    HubError::Config(format!(
                        "role override {:?} must look like `account=arn`",
                        entry
                    ))
                })
        })
        .collect()
}
