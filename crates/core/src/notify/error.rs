use thiserror::Error;

/// # Summary
/// 音频子系统错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 调用方只记录日志并跳过本次提醒，不向上传播。
#[derive(Error, Debug)]
pub enum AudioError {
    /// 没有可用的输出设备
    #[error("Audio device unavailable: {0}")]
    Unavailable(String),

    /// 设备处于挂起状态且恢复失败
    #[error("Audio subsystem suspended: {0}")]
    Suspended(String),

    /// 播放过程中的底层错误
    #[error("Playback error: {0}")]
    Playback(String),
}
