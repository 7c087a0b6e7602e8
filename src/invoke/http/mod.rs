//! 调用网关的 HTTP 实现
//!
//! 核心组件：
//! - `HttpInvocationClient`: 通过网关调用远端 agent，响应为 SSE 流
//! - `HttpRuntimeConnector`: 为跨账户租约构造专属客户端
//! - `HttpStsClient`: 通过网关 assume role / 校验身份
//! - `SseParser`: 网关 SSE 事件解析器（不依赖 reqwest，始终编译）

#[cfg(feature = "http-client")]
pub mod generic;
pub mod stream;
#[cfg(feature = "http-client")]
pub mod sts;

#[cfg(feature = "http-client")]
pub use generic::{HttpInvocationClient, HttpRuntimeConnector};
pub use stream::{GatewayEvent, SseParser};
#[cfg(feature = "http-client")]
pub use sts::HttpStsClient;
