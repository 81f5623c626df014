use async_trait::async_trait;
use kanshi_core::alert::entity::Urgency;
use kanshi_core::notify::entity::ToneProfile;
use kanshi_core::notify::port::{AlertNotifier, TonePlayer};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// # Summary
/// 单飞的声音提醒器。
///
/// # Invariants
/// - 同一时刻最多一个提醒音；`sounding` 在任何可能失败的步骤之前置位。
/// - 每个提醒音最多持续 `tone_duration`，到期由定时任务停止。
/// - `generation` 每次开始或停止提醒都会递增，过期的定时任务据此放弃操作。
/// - 开始与停止互斥地经过 `transition`：`sounding` 只在持有它时被置位或清除。
#[derive(Clone)]
pub struct AudioNotifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    player: Arc<dyn TonePlayer>,
    tone_duration: Duration,
    muted: AtomicBool,
    sounding: AtomicBool,
    generation: AtomicU64,
    transition: tokio::sync::Mutex<()>,
    stop_task: Mutex<Option<JoinHandle<()>>>,
}

impl NotifierInner {
    fn take_stop_task(&self) -> Option<JoinHandle<()>> {
        self.stop_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// 停止播放并释放闸门，未在播放时为空操作
    async fn release(&self) {
        let _transition = self.transition.lock().await;
        if self.sounding.load(Ordering::Acquire) {
            self.player.stop_tone().await;
            self.sounding.store(false, Ordering::Release);
        }
    }

    async fn silence(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.take_stop_task() {
            task.abort();
        }
        self.release().await;
    }

    /// 定时任务到期：仅当期间没有新的开始/停止时才生效
    async fn expire(&self, generation: u64) {
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        // 这里运行在定时任务自身之中，只丢弃句柄而不 abort
        drop(self.take_stop_task());
        debug!("Alert tone reached its duration");
        self.release().await;
    }
}

impl AudioNotifier {
    pub fn new(player: Arc<dyn TonePlayer>, tone_duration: Duration, muted: bool) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                player,
                tone_duration,
                muted: AtomicBool::new(muted),
                sounding: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                transition: tokio::sync::Mutex::new(()),
                stop_task: Mutex::new(None),
            }),
        }
    }

    /// 静音时立即结束正在播放的提醒音
    fn on_mute_changed(&self, muted: bool) {
        info!("Audio alerts {}", if muted { "muted" } else { "unmuted" });
        if !muted || !self.inner.sounding.load(Ordering::SeqCst) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = self.inner.clone();
                handle.spawn(async move { inner.silence().await });
            }
            Err(_) => warn!("No runtime available to silence the current tone"),
        }
    }

    fn schedule_stop(&self, generation: u64) {
        let weak: Weak<NotifierInner> = Arc::downgrade(&self.inner);
        let duration = self.inner.tone_duration;
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(generation).await;
            }
        });
        let previous = self
            .inner
            .stop_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

#[async_trait]
impl AlertNotifier for AudioNotifier {
    /// # Summary
    /// 播放一次提醒音。
    ///
    /// # Logic
    /// 1. 已有提醒音在播放、另一次开始/停止尚未完成或处于静音时直接返回 `false`。
    /// 2. 抢占闸门后唤醒音频设备；设备无法恢复时释放闸门并静默放弃。
    /// 3. 按紧急程度选择音色开始连续播放，并安排 `tone_duration` 后自动停止。
    /// 4. 若启动期间被 `stop` 打断，交由排队中的停止操作结束播放。
    async fn alert(&self, urgency: Urgency) -> bool {
        let inner = &self.inner;
        let Ok(_transition) = inner.transition.try_lock() else {
            debug!("Alert {} dropped: a tone is starting or stopping", urgency);
            return false;
        };
        if inner
            .sounding
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Alert {} dropped: a tone is already sounding", urgency);
            return false;
        }
        // 先置闸门再查静音，与 on_mute_changed 的顺序相反
        if inner.muted.load(Ordering::SeqCst) {
            debug!("Alert {} suppressed: muted", urgency);
            inner.sounding.store(false, Ordering::SeqCst);
            return false;
        }
        let generation = inner.generation.fetch_add(1, Ordering::AcqRel) + 1;

        if let Err(e) = inner.player.resume().await {
            warn!("Audio device could not be resumed, alert skipped: {}", e);
            inner.sounding.store(false, Ordering::Release);
            return false;
        }

        let profile = ToneProfile::for_urgency(urgency);
        if let Err(e) = inner.player.play_tone(&profile).await {
            warn!("Failed to start {} tone: {}", urgency, e);
            inner.sounding.store(false, Ordering::Release);
            return false;
        }

        // generation 变化说明有 stop 正在等待 transition，由它停止播放并释放闸门
        if inner.generation.load(Ordering::Acquire) != generation {
            debug!("Alert {} cancelled while starting", urgency);
            return false;
        }

        self.schedule_stop(generation);
        true
    }

    /// 立即结束当前提醒音并取消定时停止，可重复调用
    async fn stop(&self) {
        self.inner.silence().await;
    }

    fn set_muted(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::SeqCst);
        self.on_mute_changed(muted);
    }

    fn toggle_mute(&self) -> bool {
        let muted = !self.inner.muted.fetch_xor(true, Ordering::SeqCst);
        self.on_mute_changed(muted);
        muted
    }

    fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::Acquire)
    }

    fn is_sounding(&self) -> bool {
        self.inner.sounding.load(Ordering::Acquire)
    }
}
