use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 默认跨账户角色 ARN 模板，`{account_id}` 会替换为目标账户
pub const DEFAULT_ROLE_ARN_TEMPLATE: &str =
    "arn:aws:iam::{account_id}:role/cmcCrossAccountBedrockInvokeRole";

const ACCOUNT_PLACEHOLDER: &str = "{account_id}";

/// 临时凭证，只属于一个目标账户
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumedCredentialSet {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AssumedCredentialSet {
    /// 在 `now + margin` 之前仍有效才可复用
    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

impl fmt::Debug for AssumedCredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumedCredentialSet")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub role_session_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account: String,
    #[serde(default)]
    pub arn: Option<String>,
}

/// 跨账户角色配置
///
/// 角色 ARN 由目标账户推导：先查 `overrides`，否则把模板中的 `{account_id}` 替换掉。
/// 模板不含占位符时所有目标账户共用同一个角色。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossAccountRole {
    pub role_arn_template: String,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default = "CrossAccountRole::default_session_prefix")]
    pub session_name_prefix: String,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

impl CrossAccountRole {
    fn default_session_prefix() -> String {
        "HubSession".to_string()
    }

    pub fn new(role_arn_template: impl Into<String>) -> Self {
        Self {
            role_arn_template: role_arn_template.into(),
            overrides: HashMap::new(),
            external_id: None,
            session_name_prefix: Self::default_session_prefix(),
            duration_seconds: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_override(mut self, account_id: impl Into<String>, role_arn: impl Into<String>) -> Self {
        self.overrides.insert(account_id.into(), role_arn.into());
        self
    }

    pub fn role_arn_for(&self, account_id: &str) -> String {
        match self.overrides.get(account_id) {
            Some(arn) => arn.clone(),
            None => self.role_arn_template.replace(ACCOUNT_PLACEHOLDER, account_id),
        }
    }

    pub fn request_for(&self, account_id: &str) -> AssumeRoleRequest {
        AssumeRoleRequest {
            role_arn: self.role_arn_for(account_id),
            role_session_name: format!("{}-{}", self.session_name_prefix, account_id),
            external_id: self.external_id.clone(),
            duration_seconds: self.duration_seconds,
        }
    }
}

impl Default for CrossAccountRole {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_ARN_TEMPLATE)
    }
}
