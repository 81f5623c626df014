use axum::Json;
use axum::extract::State;
use kanshi_engine::sync::PollOutcome;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiResponse, FocusResponse, MuteRequest, MuteResponse, SyncResponse};

fn into_sync_response(outcome: PollOutcome) -> Result<Json<ApiResponse<SyncResponse>>, ApiError> {
    match outcome {
        PollOutcome::Synced(report) => Ok(Json(ApiResponse::ok(SyncResponse::synced(&report)))),
        PollOutcome::Skipped => Ok(Json(ApiResponse::ok(SyncResponse::skipped()))),
        PollOutcome::Failed(msg) => Err(ApiError::Upstream(msg)),
    }
}

/// 立即同步
///
/// 已有同步在进行时不会排队，直接返回 `skipped`。
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    tag = "控制 (Control)",
    responses(
        (status = 200, description = "同步完成或被跳过", body = ApiResponse<SyncResponse>),
        (status = 502, description = "数据源抓取失败")
    )
)]
pub async fn force_sync(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SyncResponse>>, ApiError> {
    into_sync_response(state.engine.force_poll().await)
}

/// 完整重载
///
/// 丢弃所有高亮并重新加载，本次加载不会触发提醒。
#[utoipa::path(
    post,
    path = "/api/v1/reload",
    tag = "控制 (Control)",
    responses(
        (status = 200, description = "重载完成或被跳过", body = ApiResponse<SyncResponse>),
        (status = 502, description = "数据源抓取失败")
    )
)]
pub async fn reload(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SyncResponse>>, ApiError> {
    into_sync_response(state.engine.reload().await)
}

/// 设置静音
#[utoipa::path(
    put,
    path = "/api/v1/mute",
    tag = "控制 (Control)",
    request_body = MuteRequest,
    responses(
        (status = 200, description = "设置成功", body = ApiResponse<MuteResponse>)
    )
)]
pub async fn set_mute(
    State(state): State<AppState>,
    Json(req): Json<MuteRequest>,
) -> Json<ApiResponse<MuteResponse>> {
    let notifier = state.engine.notifier();
    notifier.set_muted(req.muted);
    Json(ApiResponse::ok(MuteResponse {
        muted: notifier.is_muted(),
    }))
}

/// 切换静音
#[utoipa::path(
    post,
    path = "/api/v1/mute/toggle",
    tag = "控制 (Control)",
    responses(
        (status = 200, description = "切换成功", body = ApiResponse<MuteResponse>)
    )
)]
pub async fn toggle_mute(State(state): State<AppState>) -> Json<ApiResponse<MuteResponse>> {
    let muted = state.engine.notifier().toggle_mute();
    Json(ApiResponse::ok(MuteResponse { muted }))
}

/// 获取最近一次焦点跳转
///
/// 前端轮询本接口，序号变化时把目标卡片滚动到可视区域。
#[utoipa::path(
    get,
    path = "/api/v1/focus",
    tag = "控制 (Control)",
    responses(
        (status = 200, description = "获取成功", body = ApiResponse<FocusResponse>)
    )
)]
pub async fn get_focus(State(state): State<AppState>) -> Json<ApiResponse<FocusResponse>> {
    Json(ApiResponse::ok(FocusResponse::from(state.focus.latest())))
}
