use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::instrument;

use super::stream::{GatewayEvent, SseParser};
use crate::credentials::{AssumedCredentialSet, RuntimeConnector};
use crate::error::{HubError, Result};
use crate::invoke::client::{DynInvocationClient, InvocationClient};
use crate::invoke::types::{AgentInvocation, ChunkStream, RemoteError};
use crate::registry::AgentType;

pub(crate) const ACCESS_KEY_HEADER: &str = "x-hub-access-key-id";
pub(crate) const SECRET_KEY_HEADER: &str = "x-hub-secret-access-key";
pub(crate) const SESSION_TOKEN_HEADER: &str = "x-hub-session-token";
pub(crate) const RUNTIME_SESSION_HEADER: &str = "x-hub-runtime-session-id";

/// 在网关地址后追加路径段
///
/// 每段单独做百分号编码，段内的 `/`、`?`、`#` 不会改变路由。空段和 `.`/`..` 直接拒绝。
pub(crate) fn gateway_url(
    endpoint: &str,
    segments: &[&str],
) -> std::result::Result<reqwest::Url, RemoteError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(RemoteError::new(
            "ValidationException",
            format!("{:?} is not a usable path segment", bad),
        ));
    }

    let mut url = reqwest::Url::parse(endpoint).map_err(|e| {
        RemoteError::transport(format!("invalid gateway endpoint {:?}: {}", endpoint, e))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            RemoteError::transport(format!("gateway endpoint {:?} cannot carry a path", endpoint))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 构造共享连接池的 HTTP 客户端
///
/// 凭证按请求头传递，不绑定在连接上，所以多个账户可以共用一个连接池。
/// 不设置整体超时：流式响应的截止时间由调用方控制。
pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| HubError::Other(anyhow::anyhow!("failed to build HTTP client: {}", e)))
}

pub(crate) fn with_credentials(
    builder: reqwest::RequestBuilder,
    credentials: Option<&AssumedCredentialSet>,
) -> reqwest::RequestBuilder {
    match credentials {
        Some(creds) => builder
            .header(ACCESS_KEY_HEADER, &creds.access_key)
            .header(SECRET_KEY_HEADER, &creds.secret_key)
            .header(SESSION_TOKEN_HEADER, &creds.session_token),
        None => builder,
    }
}

/// 把网关的错误响应体解析为 [`RemoteError`]
///
/// 兼容 `{"__type": "...", "message": "..."}` 和 `{"error": {"type", "message"}}` 两种写法。
pub(crate) fn remote_error_from_body(status: reqwest::StatusCode, body: &str) -> RemoteError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(value) => {
            let code = value["__type"]
                .as_str()
                .or_else(|| value["error"]["type"].as_str())
                .or_else(|| value["code"].as_str())
                .map(str::to_string);
            let message = value["message"]
                .as_str()
                .or_else(|| value["error"]["message"].as_str())
                .map(str::to_string);
            (code, message)
        }
        None => (None, None),
    };

    RemoteError::new(
        code.unwrap_or_else(|| format!("HttpStatus{}", status.as_u16())),
        message.unwrap_or_else(|| body.to_string()),
    )
}

/// 经由调用网关访问远端 agent 的 HTTP 客户端
///
/// 本地客户端不带凭证（网关使用自身身份）；跨账户客户端只携带其租约凭证。
#[derive(Clone)]
pub struct HttpInvocationClient {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    credentials: Option<AssumedCredentialSet>,
}

impl HttpInvocationClient {
    pub fn local(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint.into(),
            client_id: "local".to_string(),
            credentials: None,
        })
    }

    pub fn with_credentials(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        account_id: &str,
        credentials: AssumedCredentialSet,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            client_id: format!("cross-account:{}", account_id),
            credentials: Some(credentials),
        }
    }

    fn invoke_url(
        &self,
        invocation: &AgentInvocation,
    ) -> std::result::Result<reqwest::Url, RemoteError> {
        gateway_url(
            &self.endpoint,
            &[
                "agents",
                invocation.agent_id.as_str(),
                "agentAliases",
                invocation.agent_alias_id.as_str(),
                "sessions",
                invocation.session_id.as_str(),
                "text",
            ],
        )
    }

    fn runtime_url(
        &self,
        invocation: &AgentInvocation,
    ) -> std::result::Result<reqwest::Url, RemoteError> {
        let arn = invocation.agent_runtime_arn.as_deref().ok_or_else(|| {
            RemoteError::new(
                "ValidationException",
                format!("agentcore agent `{}` has no agent_runtime_arn", invocation.agent_id),
            )
        })?;
        gateway_url(&self.endpoint, &["runtimes", arn, "invocations"])
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &reqwest::Url,
    ) -> std::result::Result<reqwest::Response, RemoteError> {
        let response = with_credentials(request, self.credentials.as_ref())
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(remote_error_from_body(status, &text));
        }
        Ok(response)
    }

    /// Bedrock agent：SSE 分片流
    async fn invoke_bedrock(
        &self,
        invocation: AgentInvocation,
    ) -> std::result::Result<ChunkStream, RemoteError> {
        let url = self.invoke_url(&invocation)?;
        let request = self
            .client
            .post(url.clone())
            .header("Accept", "text/event-stream")
            .json(&json!({ "inputText": invocation.input_text }));
        let response = self.send(request, &url).await?;
        Ok(sse_chunks(response.bytes_stream()))
    }

    /// AgentCore 运行时：一次性读完响应体，作为单个分片返回
    async fn invoke_runtime(
        &self,
        invocation: AgentInvocation,
    ) -> std::result::Result<ChunkStream, RemoteError> {
        let url = self.runtime_url(&invocation)?;
        let request = self
            .client
            .post(url.clone())
            .header("Accept", "application/json")
            .header(RUNTIME_SESSION_HEADER, invocation.session_id.as_str())
            .json(&runtime_payload(&invocation));
        let response = self.send(request, &url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::transport(format!("reading {} failed: {}", url, e)))?;

        let chunks: Vec<std::result::Result<Vec<u8>, RemoteError>> = if body.is_empty() {
            Vec::new()
        } else {
            vec![Ok(body.to_vec())]
        };
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

fn runtime_payload(invocation: &AgentInvocation) -> Value {
    json!({
        "prompt": invocation.input_text,
        "session_id": invocation.session_id,
        "actor_id": invocation.actor_id,
    })
}

#[async_trait]
impl InvocationClient for HttpInvocationClient {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    #[instrument(
        skip(self, invocation),
        fields(client = %self.client_id, agent_id = %invocation.agent_id, agent_type = invocation.agent_type.as_str())
    )]
    async fn invoke_agent(
        &self,
        invocation: AgentInvocation,
    ) -> std::result::Result<ChunkStream, RemoteError> {
        match invocation.agent_type {
            AgentType::BedrockAgent => self.invoke_bedrock(invocation).await,
            AgentType::AgentCore => self.invoke_runtime(invocation).await,
        }
    }
}

fn sse_chunks<S, B, E>(body: S) -> ChunkStream
where
    S: futures::Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    struct State<S> {
        body: std::pin::Pin<Box<S>>,
        parser: SseParser,
        pending: VecDeque<GatewayEvent>,
        finished: bool,
    }

    let state = State {
        body: Box::pin(body),
        parser: SseParser::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            match state.pending.pop_front() {
                Some(GatewayEvent::Chunk(bytes)) => return Some((Ok(bytes), state)),
                Some(GatewayEvent::Error(err)) => {
                    state.finished = true;
                    state.pending.clear();
                    return Some((Err(err), state));
                }
                Some(GatewayEvent::Done) => {
                    state.finished = true;
                    continue;
                }
                None => {}
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => match state.parser.feed(bytes.as_ref()) {
                    Ok(events) => state.pending.extend(events),
                    Err(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(RemoteError::transport(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    if let Err(err) = state.parser.finish() {
                        return Some((Err(err), state));
                    }
                }
            }
        }
    }))
}

/// 为租约凭证构造 [`HttpInvocationClient`]，共享同一个连接池
pub struct HttpRuntimeConnector {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRuntimeConnector {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint.into(),
        })
    }
}

impl RuntimeConnector for HttpRuntimeConnector {
    fn connect(
        &self,
        account_id: &str,
        credentials: &AssumedCredentialSet,
    ) -> std::result::Result<DynInvocationClient, RemoteError> {
        Ok(Arc::new(HttpInvocationClient::with_credentials(
            self.client.clone(),
            self.endpoint.clone(),
            account_id,
            credentials.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::types::RemoteErrorKind;
    use crate::server::normalize_session_id;

    fn invocation(agent_type: AgentType, session_id: String) -> AgentInvocation {
        AgentInvocation {
            agent_id: "PEGHWIVI5Y".into(),
            agent_alias_id: "TSTALIASID".into(),
            session_id,
            input_text: "summarize".into(),
            agent_type,
            agent_runtime_arn: None,
            actor_id: "hub-agent".into(),
        }
    }

    #[test]
    fn session_id_stays_inside_invoke_route() {
        let client = HttpInvocationClient::local("https://gateway.test/runtime/").unwrap();
        let session_id = normalize_session_id(Some("../../../sts/assume-role?x=aaaa"));
        let url = client
            .invoke_url(&invocation(AgentType::BedrockAgent, session_id))
            .unwrap();

        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 8, "unexpected path {}", url.path());
        assert_eq!(
            &segments[..6],
            ["runtime", "agents", "PEGHWIVI5Y", "agentAliases", "TSTALIASID", "sessions"]
        );
        assert!(segments[6].starts_with("..%2F..%2F..%2Fsts%2Fassume-role%3Fx=aaaa"));
        assert_eq!(segments[7], "text");
    }

    #[test]
    fn dot_segments_rejected() {
        let client = HttpInvocationClient::local("https://gateway.test").unwrap();
        let err = client
            .invoke_url(&invocation(AgentType::BedrockAgent, "..".into()))
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Validation);
    }

    #[test]
    fn agentcore_uses_runtime_route_and_payload() {
        let client = HttpInvocationClient::local("https://gateway.test").unwrap();
        let mut call = invocation(AgentType::AgentCore, "session-1".into());
        assert_eq!(
            client.runtime_url(&call).unwrap_err().kind,
            RemoteErrorKind::Validation
        );

        call.agent_runtime_arn =
            Some("arn:aws:bedrock-agentcore:us-east-1:843074507558:runtime/doc-abc".into());
        call.actor_id = "doc-processor".into();
        let url = client.runtime_url(&call).unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], "runtimes");
        assert!(segments[1].ends_with("runtime%2Fdoc-abc"));
        assert_eq!(segments[2], "invocations");

        let payload = runtime_payload(&call);
        assert_eq!(payload["prompt"], "summarize");
        assert_eq!(payload["session_id"], "session-1");
        assert_eq!(payload["actor_id"], "doc-processor");
    }

    #[tokio::test]
    async fn sse_body_becomes_chunks() {
        let frames: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"chunk\":{\"bytes\":\"SGVs\"}}\n\nda".to_vec()),
            Ok(b"ta: {\"chunk\":{\"bytes\":\"bG8=\"}}\n\ndata: [DONE]\n\n".to_vec()),
        ];
        let chunks: Vec<_> = sse_chunks(futures::stream::iter(frames)).collect().await;
        let chunks: Vec<Vec<u8>> = chunks.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(chunks, vec![b"Hel".to_vec(), b"lo".to_vec()]);
    }

    #[tokio::test]
    async fn error_event_ends_stream() {
        let frames: Vec<std::result::Result<Vec<u8>, String>> = vec![Ok(
            b"data: {\"error\":{\"type\":\"ExpiredTokenException\",\"message\":\"expired\"}}\n\ndata: {\"chunk\":{\"bytes\":\"SGVs\"}}\n\n"
                .to_vec(),
        )];
        let items: Vec<_> = sse_chunks(futures::stream::iter(frames)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[tokio::test]
    async fn transport_error_surfaces() {
        let frames: Vec<std::result::Result<Vec<u8>, String>> =
            vec![Err("connection reset".to_string())];
        let items: Vec<_> = sse_chunks(futures::stream::iter(frames)).collect().await;
        assert_eq!(
            items[0].as_ref().unwrap_err().kind,
            RemoteErrorKind::Transport
        );
    }

    #[test]
    fn error_body_parsing() {
        let err = remote_error_from_body(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"__type":"ResourceNotFoundException","message":"Failed to retrieve resource"}"#,
        );
        assert_eq!(err.kind, RemoteErrorKind::ResourceNotFound);

        let err = remote_error_from_body(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.code, "HttpStatus502");
        assert_eq!(err.message, "upstream down");
    }
}
