//! # DTO (Data Transfer Object) 层
//!
//! 将引擎的只读视图转化为面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use chrono::{DateTime, Utc};
use kanshi_core::alert::entity::ChangeSet;
use kanshi_engine::state::{ConnectionStatus, HighlightView, SignalView, WatchView};
use kanshi_engine::sync::PollReport;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::focus::FocusEvent;

fn format_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339())
}

fn field_names(fields: &ChangeSet) -> Vec<String> {
    fields.iter().map(str::to_string).collect()
}

// ============================================================
//  看板状态 DTO
// ============================================================

/// 连接与提醒状态 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// 与数据源的连接状态
    #[schema(example = "connected")]
    pub connection_status: String,
    /// 最近一次成功同步时间 (ISO 8601)
    #[schema(example = "2026-03-01T10:00:00+00:00")]
    pub last_sync_time: Option<String>,
    /// 最近一次抓取失败的原因
    pub last_error: Option<String>,
    /// 是否静音
    pub muted: bool,
    /// 是否有提醒音正在播放
    pub sounding: bool,
}

impl StatusResponse {
    pub fn new(
        status: ConnectionStatus,
        last_sync_time: Option<DateTime<Utc>>,
        last_error: Option<String>,
        muted: bool,
        sounding: bool,
    ) -> Self {
        let connection_status = match status {
            ConnectionStatus::Syncing => "syncing",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        };
        Self {
            connection_status: connection_status.to_string(),
            last_sync_time: format_time(last_sync_time),
            last_error,
            muted,
            sounding,
        }
    }
}

/// 单个实体的高亮 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HighlightResponse {
    /// 实体键，形如 `signal:<id>` 或 `watch:<symbol>`
    #[schema(example = "signal:42")]
    pub key: String,
    /// 发生变化的字段名
    #[schema(example = json!(["stopLoss", "cmp"]))]
    pub fields: Vec<String>,
    /// 提醒窗口到期时间 (ISO 8601)
    pub expires_at: Option<String>,
}

impl HighlightResponse {
    pub fn new(key: String, view: &HighlightView) -> Self {
        Self {
            key,
            fields: field_names(&view.fields),
            expires_at: format_time(view.expires_at),
        }
    }
}

/// 信号卡片 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignalResponse {
    /// 表格中的原始信号记录
    #[schema(value_type = Object)]
    pub signal: serde_json::Value,
    /// 发生变化的字段名
    pub highlights: Vec<String>,
    /// 提醒窗口内
    pub recently_alerted: bool,
    /// 已平仓且仍在提醒窗口内
    pub recently_closed: bool,
}

impl SignalResponse {
    pub fn try_from_view(view: &SignalView) -> Result<Self, serde_json::Error> {
        Ok(Self {
            signal: serde_json::to_value(&view.signal)?,
            highlights: field_names(&view.highlights),
            recently_alerted: view.recently_alerted,
            recently_closed: view.recently_closed,
        })
    }
}

/// 信号列表 DTO，按状态分为持仓中与已平仓
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignalsResponse {
    pub live: Vec<SignalResponse>,
    pub closed: Vec<SignalResponse>,
}

/// 自选条目 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchResponse {
    /// 表格中的原始自选记录
    #[schema(value_type = Object)]
    pub entry: serde_json::Value,
    pub highlights: Vec<String>,
    pub recently_alerted: bool,
}

impl WatchResponse {
    pub fn try_from_view(view: &WatchView) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entry: serde_json::to_value(&view.entry)?,
            highlights: field_names(&view.highlights),
            recently_alerted: view.recently_alerted,
        })
    }
}

// ============================================================
//  控制类 DTO
// ============================================================

/// 手动同步结果 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncResponse {
    /// `synced` 或 `skipped` (已有同步在进行)
    #[schema(example = "synced")]
    pub outcome: String,
    /// 是否按首次加载处理 (不提醒)
    pub initial: bool,
    /// 发生变化的实体数
    pub changed: usize,
    /// 本次决策的紧急程度
    #[schema(example = "NORMAL")]
    pub urgency: Option<String>,
    /// 提醒音是否响起
    pub sounded: bool,
}

impl SyncResponse {
    pub fn skipped() -> Self {
        Self {
            outcome: "skipped".to_string(),
            initial: false,
            changed: 0,
            urgency: None,
            sounded: false,
        }
    }

    pub fn synced(report: &PollReport) -> Self {
        Self {
            outcome: "synced".to_string(),
            initial: report.initial,
            changed: report.changed,
            urgency: report
                .decision
                .should_alert
                .then(|| report.decision.urgency.to_string()),
            sounded: report.sounded,
        }
    }
}

/// 设置静音请求
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MuteRequest {
    pub muted: bool,
}

/// 静音状态 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MuteResponse {
    pub muted: bool,
}

/// 焦点跳转 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FocusResponse {
    /// 单调递增序号，前端在序号变化时跳转一次
    #[schema(example = 3)]
    pub sequence: u64,
    /// 目标实体键
    #[schema(example = "signal:42")]
    pub target: Option<String>,
    pub emitted_at: Option<String>,
}

impl From<FocusEvent> for FocusResponse {
    fn from(event: FocusEvent) -> Self {
        Self {
            sequence: event.sequence,
            target: event.target.map(|key| key.to_string()),
            emitted_at: format_time(event.emitted_at),
        }
    }
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 统一 API 响应包装器
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize + ToSchema> {
    /// 是否成功
    pub success: bool,
    /// 数据载荷 (成功时)
    pub data: Option<T>,
    /// 错误信息 (失败时)
    pub error: Option<String>,
}

impl<T: Serialize + ToSchema> ApiResponse<T> {
    /// 构建成功响应
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// 构建失败响应 (不含泛型载荷)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}
