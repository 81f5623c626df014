use kanshi_core::alert::entity::{ChangeSet, EntityKey};
use kanshi_core::sheet::entity::{Signal, SignalStatus, Snapshot, TrackedField, WatchlistEntry};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// # Summary
/// 两份快照之间的差异结果。
///
/// # Invariants
/// - `changes` 中不存在空的 `ChangeSet`。
/// - `critical_status_transition`、`overnight_transition` 与 `latest_changed_key`
///   只由信号决定，自选条目的变化不参与。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    // 每个发生变化的实体及其变化字段
    pub changes: BTreeMap<EntityKey, ChangeSet>,
    // 本周期首次出现的实体
    pub new_entity_keys: BTreeSet<EntityKey>,
    // 是否有信号转入 STOPPED
    pub critical_status_transition: bool,
    // 是否有持仓中的隔夜信号发生变化
    pub overnight_transition: bool,
    // 发生变化的信号中行号最大的一个
    pub latest_changed_key: Option<EntityKey>,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// # Summary
/// 计算新快照相对上一份快照的字段级差异。
///
/// # Logic
/// 1. `previous` 为 `None` (首次加载或显式重载) 时直接返回空结果，避免启动时的提醒风暴。
/// 2. 信号按 `id` 匹配：
///    - 无对应旧记录：视为新信号，全部受跟踪字段标记为变化。
///    - 有对应旧记录：逐字段做结构相等比较，不相等的字段进入 `ChangeSet`。
/// 3. 对每个产生变化的信号：
///    - 状态变为 `STOPPED` (或新信号出生即为 `STOPPED`) 置位 `critical_status_transition`。
///    - `isBTST` 且处于持仓中置位 `overnight_transition`。
///    - 行号严格更大者成为 `latest_changed_key`，行号相同时保留先出现的信号。
/// 4. 自选条目按 `symbol` 匹配，只比较数值化后的 `price` 与 `change`。
/// 5. 旧快照中存在而新快照中消失的实体不产生任何事件。
///
/// # Arguments
/// * `previous`: 上一份快照。
/// * `next`: 本次抓取的快照。
///
/// # Returns
/// 差异结果。
pub fn diff(previous: Option<&Snapshot>, next: &Snapshot) -> DiffResult {
    let mut result = DiffResult::default();
    let Some(previous) = previous else {
        return result;
    };

    let prev_signals: HashMap<&str, &Signal> = previous
        .signals
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();
    let mut latest: Option<(u64, EntityKey)> = None;

    for signal in &next.signals {
        let key = EntityKey::Signal(signal.id.clone());
        let (changed, became_stopped) = match prev_signals.get(signal.id.as_str()) {
            Some(old) => (
                changed_fields(old, signal),
                old.status != SignalStatus::Stopped && signal.status == SignalStatus::Stopped,
            ),
            None => {
                result.new_entity_keys.insert(key.clone());
                (all_tracked_fields(), signal.status == SignalStatus::Stopped)
            }
        };

        if changed.is_empty() {
            continue;
        }

        if became_stopped {
            result.critical_status_transition = true;
        }
        if signal.is_btst && signal.is_active() {
            result.overnight_transition = true;
        }
        let newer = latest
            .as_ref()
            .is_none_or(|(index, _)| signal.sheet_index > *index);
        if newer {
            latest = Some((signal.sheet_index, key.clone()));
        }
        result.changes.insert(key, changed);
    }
    result.latest_changed_key = latest.map(|(_, key)| key);

    let prev_watch: HashMap<&str, &WatchlistEntry> = previous
        .watchlist
        .iter()
        .map(|w| (w.symbol.as_str(), w))
        .collect();

    for entry in &next.watchlist {
        let key = EntityKey::Watch(entry.symbol.clone());
        let changed = match prev_watch.get(entry.symbol.as_str()) {
            Some(old) => watch_changed_fields(old, entry),
            None => {
                result.new_entity_keys.insert(key.clone());
                ["price", "change"].into_iter().collect()
            }
        };
        if !changed.is_empty() {
            result.changes.insert(key, changed);
        }
    }

    result
}

/// # Summary
/// 比较同一信号的两个版本，返回不相等的受跟踪字段。
///
/// # Invariants
/// - 比较基于值而不是引用，`targets` 按完整序列比较。
pub fn changed_fields(old: &Signal, new: &Signal) -> ChangeSet {
    TrackedField::ALL
        .into_iter()
        .filter(|field| field_differs(*field, old, new))
        .map(TrackedField::name)
        .collect()
}

fn all_tracked_fields() -> ChangeSet {
    TrackedField::ALL.into_iter().map(TrackedField::name).collect()
}

fn field_differs(field: TrackedField, a: &Signal, b: &Signal) -> bool {
    match field {
        TrackedField::Status => status_differs(&a.status, &b.status),
        TrackedField::Instrument => a.instrument != b.instrument,
        TrackedField::Symbol => a.symbol != b.symbol,
        TrackedField::Type => a.kind != b.kind,
        TrackedField::Action => a.action != b.action,
        TrackedField::EntryPrice => a.entry_price != b.entry_price,
        TrackedField::StopLoss => a.stop_loss != b.stop_loss,
        TrackedField::Targets => a.targets != b.targets,
        TrackedField::TrailingSl => a.trailing_sl != b.trailing_sl,
        TrackedField::PnlPoints => a.pnl_points != b.pnl_points,
        TrackedField::PnlRupees => a.pnl_rupees != b.pnl_rupees,
        TrackedField::Comment => a.comment != b.comment,
        TrackedField::TargetsHit => a.targets_hit != b.targets_hit,
        TrackedField::Quantity => a.quantity != b.quantity,
        TrackedField::Cmp => a.cmp != b.cmp,
        TrackedField::IsBtst => a.is_btst != b.is_btst,
    }
}

/// 新值为无法识别的状态时视为未变化，脏数据不会在每次轮询中重复触发提醒；
/// 旧值无法识别而新值可识别时按正常变化处理。
fn status_differs(old: &SignalStatus, new: &SignalStatus) -> bool {
    !new.is_unknown() && old != new
}

/// # Summary
/// 比较自选条目的价格与涨跌。
///
/// # Logic
/// 两侧都能转换为数字且数值不同才算变化；任意一侧无法转换视为未变化，
/// 避免单条脏数据引发提醒。
pub fn watch_changed_fields(old: &WatchlistEntry, new: &WatchlistEntry) -> ChangeSet {
    let mut changed = ChangeSet::new();
    if numbers_differ(old.price.as_number(), new.price.as_number()) {
        changed.insert("price");
    }
    if numbers_differ(old.change.as_number(), new.change.as_number()) {
        changed.insert("change");
    }
    changed
}

fn numbers_differ(old: Option<f64>, new: Option<f64>) -> bool {
    match (old, new) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanshi_core::sheet::entity::Cell;

    fn signal(id: &str, sheet_index: u64) -> Signal {
        Signal {
            id: id.to_string(),
            sheet_index,
            symbol: format!("SYM{}", id),
            entry_price: Some(100.0),
            stop_loss: Some(90.0),
            targets: vec![110.0, 120.0],
            ..Signal::default()
        }
    }

    fn snapshot(signals: Vec<Signal>) -> Snapshot {
        Snapshot {
            signals,
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_first_load_yields_no_changes() {
        let next = snapshot(vec![signal("1", 1), signal("2", 2)]);
        let result = diff(None, &next);
        assert!(!result.has_changes());
        assert!(result.new_entity_keys.is_empty());
        assert_eq!(result.latest_changed_key, None);
    }

    #[test]
    fn test_only_changed_field_is_reported() {
        let before = snapshot(vec![signal("A", 1)]);
        let mut moved = signal("A", 1);
        moved.stop_loss = Some(95.0);
        let after = snapshot(vec![moved]);

        let result = diff(Some(&before), &after);
        let set = &result.changes[&EntityKey::Signal("A".to_string())];
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["stopLoss"]);
    }

    #[test]
    fn test_targets_compare_whole_sequence() {
        let before = snapshot(vec![signal("A", 1)]);
        let mut same = signal("A", 1);
        same.targets = vec![110.0, 120.0];
        assert!(!diff(Some(&before), &snapshot(vec![same])).has_changes());

        let mut reordered = signal("A", 1);
        reordered.targets = vec![120.0, 110.0];
        let result = diff(Some(&before), &snapshot(vec![reordered]));
        assert!(result.changes[&EntityKey::Signal("A".to_string())].contains("targets"));
    }

    #[test]
    fn test_new_signal_marks_every_tracked_field() {
        let before = snapshot(vec![signal("1", 1)]);
        let after = snapshot(vec![signal("1", 1), signal("2", 2)]);
        let result = diff(Some(&before), &after);

        let key = EntityKey::Signal("2".to_string());
        assert_eq!(result.changes[&key].len(), TrackedField::ALL.len());
        assert!(result.new_entity_keys.contains(&key));
        assert_eq!(result.latest_changed_key, Some(key));
        assert!(!result.critical_status_transition);
    }

    #[test]
    fn test_latest_changed_key_prefers_highest_sheet_index() {
        let before = snapshot(vec![signal("a", 9), signal("b", 5)]);
        let mut a = signal("a", 9);
        a.cmp = Some(101.0);
        let mut b = signal("b", 5);
        b.cmp = Some(99.0);
        let result = diff(Some(&before), &snapshot(vec![b, a]));
        assert_eq!(
            result.latest_changed_key,
            Some(EntityKey::Signal("a".to_string()))
        );
    }

    #[test]
    fn test_stop_transition_is_critical() {
        let before = snapshot(vec![signal("1", 1)]);
        let mut stopped = signal("1", 1);
        stopped.status = SignalStatus::Stopped;
        let result = diff(Some(&before), &snapshot(vec![stopped]));
        assert!(result.critical_status_transition);

        // 已经是 STOPPED 的信号再变化不算新的止损
        let mut again = signal("1", 1);
        again.status = SignalStatus::Stopped;
        again.comment = "SL hit at 90".to_string();
        let before_stopped = result_snapshot_with_status(SignalStatus::Stopped);
        let result = diff(Some(&before_stopped), &snapshot(vec![again]));
        assert!(result.has_changes());
        assert!(!result.critical_status_transition);
    }

    fn result_snapshot_with_status(status: SignalStatus) -> Snapshot {
        let mut s = signal("1", 1);
        s.status = status;
        snapshot(vec![s])
    }

    #[test]
    fn test_unknown_status_does_not_hide_other_changes() {
        let before = snapshot(vec![signal("1", 1), signal("2", 2)]);
        let mut moved = signal("1", 1);
        moved.stop_loss = Some(80.0);
        let mut pending = signal("2", 2);
        pending.status = SignalStatus::Unknown("PENDING REVIEW".to_string());
        let after = snapshot(vec![moved, pending.clone()]);

        let result = diff(Some(&before), &after);
        let keys: Vec<_> = result.changes.keys().cloned().collect();
        assert_eq!(keys, vec![EntityKey::Signal("1".to_string())]);
        assert!(result.changes[&keys[0]].contains("stopLoss"));
        assert!(!result.critical_status_transition);

        // 脏状态持续存在也不会反复报告变化
        let again = snapshot(vec![signal("1", 1), pending]);
        let result = diff(Some(&after), &again);
        assert!(!result.changes.contains_key(&EntityKey::Signal("2".to_string())));

        // 修正为 STOPPED 时按正常的止损转换处理
        let mut fixed = signal("2", 2);
        fixed.status = SignalStatus::Stopped;
        let result = diff(Some(&again), &snapshot(vec![signal("1", 1), fixed]));
        assert!(result.changes[&EntityKey::Signal("2".to_string())].contains("status"));
        assert!(result.critical_status_transition);
    }

    #[test]
    fn test_overnight_requires_active_btst() {
        let mut base = signal("1", 1);
        base.is_btst = true;
        let before = snapshot(vec![base.clone()]);

        let mut active = base.clone();
        active.cmp = Some(104.0);
        assert!(diff(Some(&before), &snapshot(vec![active])).overnight_transition);

        let mut exited = base;
        exited.status = SignalStatus::Exited;
        assert!(!diff(Some(&before), &snapshot(vec![exited])).overnight_transition);
    }

    #[test]
    fn test_watchlist_numeric_coercion() {
        let before = Snapshot {
            watchlist: vec![WatchlistEntry {
                symbol: "NIFTY".to_string(),
                price: Cell::from(123.0),
                change: Cell::from(0.5),
                ..WatchlistEntry::default()
            }],
            ..Snapshot::default()
        };
        let same = Snapshot {
            watchlist: vec![WatchlistEntry {
                symbol: "NIFTY".to_string(),
                price: Cell::from("123.0"),
                change: Cell::from("0.50"),
                ..WatchlistEntry::default()
            }],
            ..Snapshot::default()
        };
        assert!(!diff(Some(&before), &same).has_changes());

        let garbage = Snapshot {
            watchlist: vec![WatchlistEntry {
                symbol: "NIFTY".to_string(),
                price: Cell::from("#N/A"),
                change: Cell::from(0.5),
                ..WatchlistEntry::default()
            }],
            ..Snapshot::default()
        };
        assert!(!diff(Some(&before), &garbage).has_changes());
    }

    #[test]
    fn test_watchlist_does_not_drive_signal_flags() {
        let before = Snapshot {
            watchlist: vec![WatchlistEntry {
                symbol: "BANKNIFTY".to_string(),
                price: Cell::from(51000.0),
                ..WatchlistEntry::default()
            }],
            ..Snapshot::default()
        };
        let after = Snapshot {
            watchlist: vec![WatchlistEntry {
                symbol: "BANKNIFTY".to_string(),
                price: Cell::from(51010.0),
                ..WatchlistEntry::default()
            }],
            ..Snapshot::default()
        };
        let result = diff(Some(&before), &after);
        let key = EntityKey::Watch("BANKNIFTY".to_string());
        assert_eq!(result.changes[&key].iter().collect::<Vec<_>>(), vec!["price"]);
        assert_eq!(result.latest_changed_key, None);
        assert!(!result.critical_status_transition);
        assert!(!result.overnight_transition);
    }

    #[test]
    fn test_vanished_signal_is_not_an_event() {
        let before = snapshot(vec![signal("1", 1), signal("2", 2)]);
        let after = snapshot(vec![signal("1", 1)]);
        assert!(!diff(Some(&before), &after).has_changes());
    }
}
