use crate::policy::{Decision, decide};
use crate::state::{ConnectionStatus, DashboardState, DashboardView};
use chrono::{DateTime, Utc};
use kanshi_core::common::time::TimeProvider;
use kanshi_core::config::SyncConfig;
use kanshi_core::notify::port::{AlertNotifier, FocusSink};
use kanshi_core::sheet::entity::Snapshot;
use kanshi_core::sheet::port::SnapshotSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// 调度器的时间参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub sweep_interval: Duration,
    pub alert_window: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            sweep_interval: config.sweep_interval(),
            alert_window: config.alert_window(),
        }
    }
}

/// 一次成功轮询的结果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub initial: bool,
    // 发生变化的实体数
    pub changed: usize,
    pub decision: Decision,
    // 提醒音是否真正响起
    pub sounded: bool,
}

/// 单次轮询请求的结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Synced(PollReport),
    Failed(String),
    // 已有轮询在进行，本次请求被丢弃
    Skipped,
}

/// # Summary
/// 单飞令牌，持有期间其它轮询请求会被丢弃。
///
/// # Invariants
/// - 令牌在析构时释放，覆盖正常返回、错误返回与任务被取消三种路径。
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct EngineInner {
    source: Arc<dyn SnapshotSource>,
    notifier: Arc<dyn AlertNotifier>,
    focus: Arc<dyn FocusSink>,
    clock: Arc<dyn TimeProvider>,
    settings: SyncSettings,
    state: Mutex<DashboardState>,
    in_flight: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl EngineInner {
    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// # Summary
    /// 执行一个完整的轮询周期。
    ///
    /// # Logic
    /// 1. 抢占单飞令牌，失败则直接丢弃本次请求。
    /// 2. 抓取快照；失败时只记录错误状态，基准快照与高亮保持不变。
    /// 3. 成功时在同一个临界区内完成差异计算与窗口登记。
    /// 4. 根据决策分别触发焦点跳转与提醒音，两者互不影响。
    async fn poll(&self) -> PollOutcome {
        let Some(_guard) = FlightGuard::acquire(&self.in_flight) else {
            debug!("Poll skipped: another poll is in flight");
            return PollOutcome::Skipped;
        };

        self.state().begin_sync();
        let fetched = self.source.fetch_snapshot().await;

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Snapshot fetch failed: {}", e);
                let message = e.to_string();
                self.state().record_failure(message.clone());
                return PollOutcome::Failed(message);
            }
        };

        let now = self.clock.now();
        let (result, initial) = self.state().apply_snapshot(snapshot, now);
        let decision = decide(&result, initial);
        debug!(
            "Poll applied: initial={}, changed={}, urgency={}",
            initial,
            result.changes.len(),
            decision.urgency
        );

        if let Some(target) = &decision.focus_target {
            self.focus.focus(target);
        }

        let sounded = if decision.should_alert {
            let sounded = self.notifier.alert(decision.urgency).await;
            if sounded {
                info!(
                    "Alert raised: {} ({} entities changed)",
                    decision.urgency,
                    result.changes.len()
                );
            }
            sounded
        } else {
            false
        };

        PollOutcome::Synced(PollReport {
            initial,
            changed: result.changes.len(),
            decision,
            sounded,
        })
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let evicted = self.state().sweep(now);
        if evicted > 0 {
            debug!("Sweep evicted {} alert windows", evicted);
        }
        evicted
    }
}

/// # Summary
/// 表格同步引擎：定时轮询、差异计算、提醒调度。
///
/// # Invariants
/// - 任一时刻至多一个轮询在进行。
/// - 状态锁从不跨越 `.await` 持有。
/// - 后台任务只持有 `Weak` 引用，引擎全部句柄释放后任务自行退出。
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        notifier: Arc<dyn AlertNotifier>,
        focus: Arc<dyn FocusSink>,
        clock: Arc<dyn TimeProvider>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                source,
                notifier,
                focus,
                clock,
                state: Mutex::new(DashboardState::new(settings.alert_window)),
                settings,
                in_flight: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// # Summary
    /// 启动轮询与清扫两个后台定时器。
    ///
    /// # Logic
    /// 1. 已在运行时为空操作。
    /// 2. 轮询定时器的首次触发是立即的，之后每个 `poll_interval` 触发一次；
    ///    错过的触发直接跳过，不做补偿。
    /// 3. 清扫定时器每个 `sweep_interval` 清除一次过期窗口。
    pub fn start(&self) {
        let mut tasks = self.inner.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if !tasks.is_empty() {
            debug!("Sync engine already running");
            return;
        }

        let settings = self.inner.settings;
        info!(
            "Sync engine started: poll every {:?}, alert window {:?}",
            settings.poll_interval, settings.alert_window
        );

        let weak = Arc::downgrade(&self.inner);
        tasks.push(tokio::spawn(poll_loop(weak, settings.poll_interval)));

        let weak = Arc::downgrade(&self.inner);
        tasks.push(tokio::spawn(sweep_loop(weak, settings.sweep_interval)));
    }

    /// 立即发起一次带外轮询，若已有轮询在进行则返回 `Skipped`
    pub async fn force_poll(&self) -> PollOutcome {
        self.inner.poll().await
    }

    /// 立即清扫一次过期窗口，返回被清除的数量
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// # Summary
    /// 完整重载：丢弃基准快照与所有高亮，然后立即轮询。
    ///
    /// # Logic
    /// 重载后的首次成功抓取按首次加载处理，不会产生提醒。
    pub async fn reload(&self) -> PollOutcome {
        info!("Full reload requested");
        self.inner.state().reset();
        self.inner.poll().await
    }

    /// # Summary
    /// 停止引擎：同时取消轮询定时器、清扫定时器以及正在播放的提醒音。
    pub async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for task in &tasks {
            task.abort();
        }
        self.inner.notifier.stop().await;
        info!("Sync engine stopped");
    }

    pub fn is_running(&self) -> bool {
        !self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.inner.state().status()
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.inner.state().last_sync_time()
    }

    /// 最近一次成功抓取的快照
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.state().snapshot()
    }

    pub fn view(&self) -> DashboardView {
        let now = self.inner.clock.now();
        self.inner.state().view(now)
    }

    pub fn notifier(&self) -> Arc<dyn AlertNotifier> {
        self.inner.notifier.clone()
    }
}

async fn poll_loop(inner: Weak<EngineInner>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(engine) = inner.upgrade() else {
            break;
        };
        engine.poll().await;
    }
    debug!("Poll loop exited");
}

async fn sweep_loop(inner: Weak<EngineInner>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(engine) = inner.upgrade() else {
            break;
        };
        engine.sweep();
    }
    debug!("Sweep loop exited");
}
