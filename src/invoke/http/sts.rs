use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::generic::{build_http_client, gateway_url, remote_error_from_body, with_credentials};
use crate::credentials::{
    AssumeRoleRequest, AssumedCredentialSet, CallerIdentity, StsApi, StsError,
};
use crate::error::Result;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssumeRoleResponse {
    credentials: GatewayCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: DateTime<Utc>,
}

/// 经由网关调用 STS
///
/// `assume_role` 使用网关自身身份；`caller_identity` 只携带传入的凭证。
pub struct HttpStsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpStsClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint.into(),
        })
    }

    fn url(&self, path: &str) -> std::result::Result<reqwest::Url, StsError> {
        gateway_url(&self.endpoint, &["sts", path]).map_err(|e| StsError::Failed(e.to_string()))
    }
}

fn classify(status: reqwest::StatusCode, body: &str) -> StsError {
    let err = remote_error_from_body(status, body);
    if status == reqwest::StatusCode::FORBIDDEN
        || status == reqwest::StatusCode::UNAUTHORIZED
        || err.code.contains("AccessDenied")
    {
        StsError::Denied(err.to_string())
    } else {
        StsError::Failed(err.to_string())
    }
}

#[async_trait]
impl StsApi for HttpStsClient {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> std::result::Result<AssumedCredentialSet, StsError> {
        let response = self
            .client
            .post(self.url("assume-role")?)
            .json(request)
            .send()
            .await
            .map_err(|e| StsError::Failed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StsError::Failed(e.to_string()))?;
        if !status.is_success() {
            return Err(classify(status, &body));
        }

        let parsed: AssumeRoleResponse = serde_json::from_str(&body)
            .map_err(|e| StsError::Failed(format!("malformed assume-role response: {}", e)))?;
        let creds = parsed.credentials;
        Ok(AssumedCredentialSet {
            access_key: creds.access_key_id,
            secret_key: creds.secret_access_key,
            session_token: creds.session_token,
            expires_at: creds.expiration,
        })
    }

    async fn caller_identity(
        &self,
        credentials: &AssumedCredentialSet,
    ) -> std::result::Result<CallerIdentity, StsError> {
        let request = self.client.post(self.url("caller-identity")?);
        let response = with_credentials(request, Some(credentials))
            .send()
            .await
            .map_err(|e| StsError::Failed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StsError::Failed(e.to_string()))?;
        if !status.is_success() {
            return Err(classify(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| StsError::Failed(format!("malformed caller-identity response: {}", e)))
    }
}
