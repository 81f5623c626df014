use thiserror::Error;

/// # Summary
/// 快照数据源错误枚举，处理网络、解析及数据缺失等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 任何变体都不是致命错误，调度器会在下一个周期无条件重试。
#[derive(Error, Debug)]
pub enum SourceError {
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 数据源返回了非成功状态码
    #[error("HTTP status {0}")]
    Status(u16),
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 未知或未分类的错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}
