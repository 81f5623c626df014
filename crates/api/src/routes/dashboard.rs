use axum::Json;
use axum::extract::State;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{
    ApiResponse, HighlightResponse, SignalResponse, SignalsResponse, StatusResponse,
    WatchResponse,
};

/// 获取连接状态
///
/// 展示层据此显示同步指示灯、最近同步时间与静音开关。
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "看板 (Dashboard)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<StatusResponse>)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let view = state.engine.view();
    let notifier = state.engine.notifier();
    Json(ApiResponse::ok(StatusResponse::new(
        view.connection_status,
        view.last_sync_time,
        view.last_error,
        notifier.is_muted(),
        notifier.is_sounding(),
    )))
}

/// 获取当前高亮
#[utoipa::path(
    get,
    path = "/api/v1/highlights",
    tag = "看板 (Dashboard)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<Vec<HighlightResponse>>)
    )
)]
pub async fn get_highlights(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<HighlightResponse>>> {
    let view = state.engine.view();
    let highlights = view
        .highlights
        .iter()
        .map(|(key, highlight)| HighlightResponse::new(key.clone(), highlight))
        .collect();
    Json(ApiResponse::ok(highlights))
}

/// 获取信号列表
///
/// 持仓中与已平仓信号分别按表格行号倒序返回。
#[utoipa::path(
    get,
    path = "/api/v1/signals",
    tag = "看板 (Dashboard)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<SignalsResponse>),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn get_signals(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SignalsResponse>>, ApiError> {
    let view = state.engine.view();
    let live = view
        .live
        .iter()
        .map(SignalResponse::try_from_view)
        .collect::<Result<Vec<_>, _>>()?;
    let closed = view
        .closed
        .iter()
        .map(SignalResponse::try_from_view)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(ApiResponse::ok(SignalsResponse { live, closed })))
}

/// 获取自选列表
#[utoipa::path(
    get,
    path = "/api/v1/watchlist",
    tag = "看板 (Dashboard)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<Vec<WatchResponse>>),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn get_watchlist(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WatchResponse>>>, ApiError> {
    let view = state.engine.view();
    let entries = view
        .watchlist
        .iter()
        .map(WatchResponse::try_from_view)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(ApiResponse::ok(entries)))
}
