use crate::alert::entity::{EntityKey, Urgency};
use crate::notify::entity::ToneProfile;
use crate::notify::error::AudioError;
use async_trait::async_trait;

/// # Summary
/// 提示音输出接口 (Port)，封装底层音频硬件。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 同一时刻最多只有一个音在播放由上层 `AudioNotifier` 保证，实现本身无需去重。
#[async_trait]
pub trait TonePlayer: Send + Sync {
    /// # Summary
    /// 唤醒可能处于挂起状态的音频子系统。
    ///
    /// # Logic
    /// 1. 若设备已就绪，直接返回成功。
    /// 2. 否则尝试打开/恢复设备。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 无法恢复返回 `Err(AudioError)`。
    async fn resume(&self) -> Result<(), AudioError>;

    /// # Summary
    /// 按给定音色开始持续播放，直到 `stop_tone` 被调用。
    ///
    /// # Arguments
    /// * `profile` - 音色参数。
    ///
    /// # Returns
    /// * 成功开始播放返回 `Ok(())`。
    async fn play_tone(&self, profile: &ToneProfile) -> Result<(), AudioError>;

    /// # Summary
    /// 立即停止当前播放，未在播放时为空操作。
    async fn stop_tone(&self);
}

/// # Summary
/// 焦点跳转协作者接口，请求展示层把某个实体滚动到可视区域。
///
/// # Invariants
/// - 每个满足条件的轮询周期至多调用一次。
/// - 调用是尽力而为的，实体在展示层不存在时由实现自行忽略。
pub trait FocusSink: Send + Sync {
    fn focus(&self, key: &EntityKey);
}

/// # Summary
/// 用户提醒接口 (Port)，由调度器在检测到变化后调用。
///
/// # Invariants
/// - 单飞：提醒进行中时再次调用 `alert` 不会叠加。
/// - 静音只影响提醒本身，不影响轮询与差异计算。
/// - 任何失败都在实现内部消化，不向调度器传播。
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// # Summary
    /// 以指定紧急程度发出一次提醒。
    ///
    /// # Returns
    /// 真正开始提醒返回 `true`；静音、已在提醒或设备不可用时返回 `false`。
    async fn alert(&self, urgency: Urgency) -> bool;

    /// 立即结束当前提醒，幂等。
    async fn stop(&self);

    fn set_muted(&self, muted: bool);

    /// # Summary
    /// 原子地切换静音状态。
    ///
    /// # Returns
    /// 切换后的静音状态。
    fn toggle_mute(&self) -> bool;

    fn is_muted(&self) -> bool;

    /// 当前是否有提醒音正在播放
    fn is_sounding(&self) -> bool;
}
