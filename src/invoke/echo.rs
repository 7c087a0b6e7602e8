use async_trait::async_trait;

use super::client::InvocationClient;
use super::types::{AgentInvocation, ChunkStream, RemoteError};

/// 本地回显客户端，开发和测试用：把输入按词切片后原样流回
#[derive(Clone)]
pub struct EchoInvocationClient {
    client_id: String,
}

impl EchoInvocationClient {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }
}

impl Default for EchoInvocationClient {
    fn default() -> Self {
        Self::new("local-echo")
    }
}

#[async_trait]
impl InvocationClient for EchoInvocationClient {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn invoke_agent(
        &self,
        invocation: AgentInvocation,
    ) -> Result<ChunkStream, RemoteError> {
        let mut chunks = vec![Ok(format!("[Echo {}] ", invocation.agent_id).into_bytes())];
        chunks.extend(
            invocation
                .input_text
                .split_inclusive(' ')
                .map(|word| Ok(word.as_bytes().to_vec())),
        );
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn echoes_input_in_word_chunks() {
        let client = EchoInvocationClient::default();
        let stream = client
            .invoke_agent(AgentInvocation {
                agent_id: "A1".into(),
                agent_alias_id: "B1".into(),
                session_id: "s".into(),
                input_text: "hello there".into(),
                agent_type: Default::default(),
                agent_runtime_arn: None,
                actor_id: "hub-agent".into(),
            })
            .await
            .unwrap();
        let chunks: Vec<Vec<u8>> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), b"[Echo A1] hello there".to_vec());
    }
}
