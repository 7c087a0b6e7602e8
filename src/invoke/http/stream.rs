use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::invoke::types::RemoteError;

/// 网关推送的单个事件
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    Chunk(Vec<u8>),
    Error(RemoteError),
    Done,
}

/// SSE (Server-Sent Events) 解析器
///
/// 网关把远端的 completion 事件流转成 SSE：
/// ```text
/// data: {"chunk":{"bytes":"SGVs"}}
///
/// data: {"error":{"type":"ThrottlingException","message":"Rate exceeded"}}
///
/// data: [DONE]
/// ```
/// 缓冲按字节处理，网络帧切断的事件会等到下一帧再解析。
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// 送入一段网络数据，返回其中已完整的事件
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<GatewayEvent>, RemoteError> {
        self.buffer.extend_from_slice(data);

        let mut events = Vec::new();
        let mut processed = 0;

        while let Some(end) = find_boundary(&self.buffer[processed..]) {
            let event_end = processed + end;
            let raw = std::str::from_utf8(&self.buffer[processed..event_end])
                .map_err(|e| RemoteError::new("MalformedEvent", e.to_string()))?;
            if let Some(event) = parse_event(raw)? {
                events.push(event);
            }
            processed = event_end + 2;
        }

        if processed > 0 {
            self.buffer.drain(..processed);
        }

        Ok(events)
    }

    /// 流结束时缓冲里仍有未完成的事件，说明连接被截断
    pub fn finish(&mut self) -> Result<(), RemoteError> {
        let leftover = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        if leftover.is_empty() {
            Ok(())
        } else {
            Err(RemoteError::transport(format!(
                "stream ended inside an event: {}",
                leftover
            )))
        }
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_event(event_text: &str) -> Result<Option<GatewayEvent>, RemoteError> {
    let data: String = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");

    if data.trim().is_empty() {
        return Ok(None);
    }
    if data.trim() == "[DONE]" {
        return Ok(Some(GatewayEvent::Done));
    }

    let json: Value = serde_json::from_str(&data).map_err(|e| {
        RemoteError::new("MalformedEvent", format!("{}: {}", e, data))
    })?;

    if let Some(encoded) = json["chunk"]["bytes"].as_str() {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| RemoteError::new("MalformedEvent", format!("chunk bytes: {}", e)))?;
        return Ok(Some(GatewayEvent::Chunk(bytes)));
    }

    if json.get("error").is_some() {
        let code = json["error"]["type"].as_str().unwrap_or("UnknownError");
        let message = json["error"]["message"].as_str().unwrap_or_default();
        return Ok(Some(GatewayEvent::Error(RemoteError::new(code, message))));
    }

    // trace / metadata 事件不参与拼接
    Ok(None)
}
