//! 聊天 HTTP 入口
//!
//! 路由：
//! - `GET  /health`          健康检查（免 API Key）
//! - `GET  /agents`          已启用的 agent 列表
//! - `POST /agents/refresh`  重新加载注册表
//! - `POST /chat`            `{prompt, session_id?, agent_id?}` -> `{response}` | `{error}`

pub mod auth;
pub mod handlers;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;
use crate::registry::RegistryHandle;

pub use handlers::{ChatRequest, ChatResponse};
pub use session::normalize_session_id;

pub struct HubState {
    pub registry: RegistryHandle,
    pub dispatcher: Dispatcher,
    pub api_key: Option<String>,
    /// 单次聊天请求的端到端上限，超时返回“仍在处理”
    pub chat_timeout: Duration,
    pub default_agent_id: Option<String>,
}

pub fn build_router(state: Arc<HubState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/agents", get(handlers::list_agents))
        .route("/agents/refresh", post(handlers::refresh_agents))
        .route("/chat", post(handlers::chat))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 绑定地址并运行，Ctrl-C 优雅退出
pub async fn serve(state: Arc<HubState>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "agent hub listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
