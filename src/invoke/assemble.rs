use futures::StreamExt;
use serde_json::Value;

use super::types::{AgentReply, ChunkStream};
use crate::error::{HubError, InvocationErrorKind, Result};

/// 按到达顺序拼接分片
///
/// - 每个分片独立按 UTF-8 解码，解码失败即整次调用失败（`decode-failure`）
/// - 流中的远端错误直接返回
/// - 一个分片都没有时返回 [`AgentReply::NoResponse`]
pub async fn assemble_reply(mut stream: ChunkStream) -> Result<AgentReply> {
    let mut text = String::new();
    let mut received = 0usize;

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        let fragment = String::from_utf8(bytes).map_err(|e| {
            HubError::invocation(
                InvocationErrorKind::DecodeFailure,
                format!("chunk {} is not valid UTF-8: {}", received, e),
            )
        })?;
        text.push_str(&fragment);
        received += 1;
    }

    tracing::debug!(chunks = received, bytes = text.len(), "response assembled");

    if received == 0 {
        Ok(AgentReply::NoResponse)
    } else {
        Ok(AgentReply::Text(text))
    }
}

/// AgentCore 运行时的返回体通常是 JSON，可能被二次编码成字符串
///
/// - JSON 字符串：解开一层；若里面仍是 JSON 对象则格式化输出
/// - JSON 对象/数组：格式化输出
/// - 其它标量：转为文本
/// - 非 JSON：原样返回
pub fn normalize_agentcore_body(body: &str) -> String {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.to_string(),
    };

    let value = match value {
        Value::String(inner) => match serde_json::from_str::<Value>(&inner) {
            Ok(decoded @ (Value::Object(_) | Value::Array(_))) => decoded,
            _ => return inner,
        },
        other => other,
    };

    match value {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string())
        }
        Value::String(s) => s,
        other => other.to_string(),
    }
}
