use std::sync::Arc;

use async_trait::async_trait;

use super::types::{AgentInvocation, ChunkStream, RemoteError};

/// 远端 agent 调用客户端
///
/// 每个实例绑定一组固定的凭证上下文（本地账户或某个跨账户租约），
/// 不会回退到进程级默认凭证。
#[async_trait]
pub trait InvocationClient: Send + Sync {
    /// 客户端标识，例如 `local` 或 `cross-account:152864141302`
    fn client_id(&self) -> &str;

    async fn invoke_agent(&self, invocation: AgentInvocation)
        -> Result<ChunkStream, RemoteError>;
}

pub type DynInvocationClient = Arc<dyn InvocationClient>;
