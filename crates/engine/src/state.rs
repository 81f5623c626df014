use crate::alert::AlertWindows;
use crate::diff::{DiffResult, diff};
use chrono::{DateTime, Utc};
use kanshi_core::alert::entity::{ChangeSet, EntityKey};
use kanshi_core::sheet::entity::{Signal, Snapshot, WatchlistEntry};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// 与数据源的连接状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Syncing,
    Connected,
    Error,
}

/// # Summary
/// 仪表盘的全部可变状态，由同步引擎独占。
///
/// # Invariants
/// - `highlights` 中的每个键在 `alerts` 中都有对应窗口；二者在同一次调用中一起增删。
/// - 抓取失败不会修改 `previous`、`highlights` 与 `alerts`。
#[derive(Debug)]
pub struct DashboardState {
    previous: Option<Arc<Snapshot>>,
    highlights: HashMap<EntityKey, ChangeSet>,
    alerts: AlertWindows,
    status: ConnectionStatus,
    last_sync_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl DashboardState {
    pub fn new(alert_window: Duration) -> Self {
        Self {
            previous: None,
            highlights: HashMap::new(),
            alerts: AlertWindows::new(alert_window),
            status: ConnectionStatus::Syncing,
            last_sync_time: None,
            last_error: None,
        }
    }

    /// 标记一次抓取开始
    pub fn begin_sync(&mut self) {
        self.status = ConnectionStatus::Syncing;
    }

    /// # Summary
    /// 应用一份成功抓取的快照。
    ///
    /// # Logic
    /// 1. 与上一份快照做差异比较；没有上一份快照时视为首次加载。
    /// 2. 每个变化实体的高亮被替换为本次的 `ChangeSet`，提醒窗口重新计时。
    /// 3. 新快照成为下一轮比较的基准，状态置为 `Connected`。
    ///
    /// # Returns
    /// `(差异结果, 是否首次加载)`。
    pub fn apply_snapshot(&mut self, next: Snapshot, now: DateTime<Utc>) -> (DiffResult, bool) {
        let initial = self.previous.is_none();
        let result = diff(self.previous.as_deref(), &next);

        for (key, fields) in &result.changes {
            self.alerts.register_change(key.clone(), now);
            self.highlights.insert(key.clone(), fields.clone());
        }

        self.previous = Some(Arc::new(next));
        self.status = ConnectionStatus::Connected;
        self.last_sync_time = Some(now);
        self.last_error = None;
        (result, initial)
    }

    /// 记录一次抓取失败，其余状态保持不变
    pub fn record_failure(&mut self, message: String) {
        self.status = ConnectionStatus::Error;
        self.last_error = Some(message);
    }

    /// # Summary
    /// 清除已过期的提醒窗口及其高亮。
    ///
    /// # Returns
    /// 被清除的实体数量。
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let evicted = self.alerts.sweep(now);
        for key in &evicted {
            self.highlights.remove(key);
        }
        evicted.len()
    }

    /// 丢弃基准快照与全部高亮，下一次成功抓取按首次加载处理
    pub fn reset(&mut self) {
        self.previous = None;
        self.highlights.clear();
        self.alerts.clear();
        self.status = ConnectionStatus::Syncing;
        self.last_error = None;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.last_sync_time
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.previous.clone()
    }

    pub fn highlights(&self) -> &HashMap<EntityKey, ChangeSet> {
        &self.highlights
    }

    pub fn alerts(&self) -> &AlertWindows {
        &self.alerts
    }

    /// # Summary
    /// 生成展示层使用的只读视图。
    ///
    /// # Logic
    /// - 信号按状态分为持仓中与已平仓两组，各自按行号倒序。
    /// - `recently_alerted`：提醒窗口仍有效。
    /// - `recently_closed`：已平仓且提醒窗口仍有效。
    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        let highlights = self
            .highlights
            .iter()
            .map(|(key, fields)| {
                let view = HighlightView {
                    fields: fields.clone(),
                    expires_at: self.alerts.expiry(key),
                };
                (key.to_string(), view)
            })
            .collect();

        let mut live = Vec::new();
        let mut closed = Vec::new();
        let mut watchlist = Vec::new();

        if let Some(snapshot) = &self.previous {
            for signal in &snapshot.signals {
                let key = EntityKey::Signal(signal.id.clone());
                let alerted = self.alerts.is_active(&key, now);
                let view = SignalView {
                    highlights: self.highlights.get(&key).cloned().unwrap_or_default(),
                    recently_alerted: alerted,
                    recently_closed: alerted && signal.is_closed(),
                    signal: signal.clone(),
                };
                if signal.is_active() {
                    live.push(view);
                } else {
                    closed.push(view);
                }
            }
            for entry in &snapshot.watchlist {
                let key = EntityKey::Watch(entry.symbol.clone());
                watchlist.push(WatchView {
                    highlights: self.highlights.get(&key).cloned().unwrap_or_default(),
                    recently_alerted: self.alerts.is_active(&key, now),
                    entry: entry.clone(),
                });
            }
        }

        live.sort_by(|a, b| b.signal.sheet_index.cmp(&a.signal.sheet_index));
        closed.sort_by(|a, b| b.signal.sheet_index.cmp(&a.signal.sheet_index));

        DashboardView {
            connection_status: self.status,
            last_sync_time: self.last_sync_time,
            last_error: self.last_error.clone(),
            highlights,
            live,
            closed,
            watchlist,
        }
    }
}

/// 展示层读取的仪表盘快照
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub connection_status: ConnectionStatus,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub highlights: BTreeMap<String, HighlightView>,
    pub live: Vec<SignalView>,
    pub closed: Vec<SignalView>,
    pub watchlist: Vec<WatchView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightView {
    pub fields: ChangeSet,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalView {
    pub signal: Signal,
    pub highlights: ChangeSet,
    pub recently_alerted: bool,
    pub recently_closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchView {
    pub entry: WatchlistEntry,
    pub highlights: ChangeSet,
    pub recently_alerted: bool,
}
