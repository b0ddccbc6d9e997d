//! # HTTP 服务器
//!
//! Axum HTTP服务器，承载认证和账户API

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::ops::Deref;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::request_id_middleware;
use crate::app::AppContext;
use crate::error::{AppError, Result};
use crate::{lerror, linfo, logging::{LogComponent, LogStage}};

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 组装完整的路由器（含中间件）
pub fn create_router(state: AppState) -> Router {
    let cors_layer = cors_layer(&state.config.server.cors_origins);

    super::routes::create_routes(state).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let parsed = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match parsed {
        // 带 Cookie 的跨域请求需要明确的源
        Ok(origins) => layer.allow_origin(origins).allow_credentials(true),
        Err(e) => {
            lerror!(
                "system",
                LogStage::Configuration,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("无效的 CORS 源配置: {e}，回退为允许任意源")
            );
            layer.allow_origin(Any)
        }
    }
}

/// HTTP 服务器
pub struct ApiServer {
    listen_addr: String,
    router: Router,
}

impl ApiServer {
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        let listen_addr = context.config.listen_addr();
        let router = create_router(AppState::new(context));
        Self {
            listen_addr,
            router,
        }
    }

    /// 启动服务器，收到 Ctrl+C 后优雅关闭
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await.map_err(|e| {
            AppError::config_with_source(format!("无法监听地址: {}", self.listen_addr), e)
        })?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("HTTP 服务器监听于 {}", self.listen_addr)
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal_with_source("HTTP 服务器异常退出", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "HTTP 服务器已关闭"
        );
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lerror!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "ctrl_c_error",
            &format!("无法监听 Ctrl+C 信号: {e:?}")
        );
        std::future::pending::<()>().await;
    }
}
