//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use kanshi_engine::sync::SyncEngine;

use crate::focus::FocusChannel;
use crate::routes::{control, dashboard};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - `engine` 与 `focus` 在服务启动前由 DI 容器注入，生命周期与进程等同。
/// - `focus` 必须与注入 `engine` 的焦点协作者是同一个实例。
#[derive(Clone)]
pub struct AppState {
    /// 同步引擎
    pub engine: SyncEngine,
    /// 焦点跳转通道
    pub focus: Arc<FocusChannel>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kanshi 信号看板 API",
        version = "0.1.0",
        description = "信号表格同步、差异高亮与提醒控制接口。"
    ),
    tags(
        (name = "看板 (Dashboard)", description = "连接状态、高亮、信号与自选列表"),
        (name = "控制 (Control)", description = "手动同步、重载、静音与焦点跳转")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// 构建完整的 axum 应用路由树 (含 Swagger UI 与 CORS)。
pub fn build_router(state: AppState) -> Router {
    let dashboard_router = OpenApiRouter::new()
        .routes(routes!(dashboard::get_status))
        .routes(routes!(dashboard::get_highlights))
        .routes(routes!(dashboard::get_signals))
        .routes(routes!(dashboard::get_watchlist));

    let control_router = OpenApiRouter::new()
        .routes(routes!(control::force_sync))
        .routes(routes!(control::reload))
        .routes(routes!(control::set_mute))
        .routes(routes!(control::toggle_mute))
        .routes(routes!(control::get_focus));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(dashboard_router)
        .merge(control_router)
        .with_state(state)
        .split_for_parts();

    // 看板前端可能由其它端口提供，允许所有来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// 在给定地址上启动 HTTP 服务，直到 `shutdown` 完成。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
/// * `shutdown` - 完成时触发优雅停机
pub async fn start_server<F>(
    state: AppState,
    bind_addr: &str,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Kanshi API Server listening on {}", bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
