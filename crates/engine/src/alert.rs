use chrono::{DateTime, TimeDelta, Utc};
use kanshi_core::alert::entity::EntityKey;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// # Summary
/// 每个实体独立的"最近变化"窗口。
///
/// # Invariants
/// - 每个实体最多一个到期时间；再次登记总是覆盖，窗口从最新一次变化重新计时。
/// - `sweep` 之后表中不存在 `expiry <= now` 的条目。
/// - 时间全部由调用方传入，本结构不读取时钟。
#[derive(Debug, Clone)]
pub struct AlertWindows {
    window: TimeDelta,
    expiries: HashMap<EntityKey, DateTime<Utc>>,
}

impl AlertWindows {
    pub fn new(window: Duration) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::days(365)),
            expiries: HashMap::new(),
        }
    }

    /// # Summary
    /// 登记一次变化并返回新的到期时间。
    ///
    /// # Logic
    /// 已存在的窗口直接被替换为 `now + window`，不做延长叠加。
    pub fn register_change(&mut self, key: EntityKey, now: DateTime<Utc>) -> DateTime<Utc> {
        let expiry = now
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expiries.insert(key, expiry);
        expiry
    }

    /// # Summary
    /// 清除所有已到期的窗口。
    ///
    /// # Returns
    /// 本次被清除的实体集合，调用方据此撤销对应的高亮。
    pub fn sweep(&mut self, now: DateTime<Utc>) -> BTreeSet<EntityKey> {
        let expired: BTreeSet<EntityKey> = self
            .expiries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.expiries.remove(key);
        }
        expired
    }

    pub fn is_active(&self, key: &EntityKey, now: DateTime<Utc>) -> bool {
        self.expiries.get(key).is_some_and(|expiry| now < *expiry)
    }

    pub fn expiry(&self, key: &EntityKey) -> Option<DateTime<Utc>> {
        self.expiries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }

    pub fn clear(&mut self) {
        self.expiries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &DateTime<Utc>)> {
        self.expiries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn key(id: &str) -> EntityKey {
        EntityKey::Signal(id.to_string())
    }

    #[test]
    fn test_window_expires_after_duration() {
        let mut windows = AlertWindows::new(Duration::from_secs(15));
        windows.register_change(key("1"), at(0));

        assert!(windows.is_active(&key("1"), at(14)));
        assert!(windows.sweep(at(14)).is_empty());

        assert!(!windows.is_active(&key("1"), at(15)));
        let expired = windows.sweep(at(15));
        assert!(expired.contains(&key("1")));
        assert!(windows.is_empty());
    }

    #[test]
    fn test_reregistration_resets_window() {
        let mut windows = AlertWindows::new(Duration::from_secs(15));
        windows.register_change(key("1"), at(0));
        let expiry = windows.register_change(key("1"), at(10));
        assert_eq!(expiry, at(25));
        assert_eq!(windows.len(), 1);

        assert!(windows.sweep(at(20)).is_empty());
        assert!(windows.is_active(&key("1"), at(20)));
        assert_eq!(windows.sweep(at(25)).len(), 1);
    }

    #[test]
    fn test_sweep_only_evicts_due_entries() {
        let mut windows = AlertWindows::new(Duration::from_secs(15));
        windows.register_change(key("1"), at(0));
        windows.register_change(EntityKey::Watch("NIFTY".to_string()), at(5));

        let expired = windows.sweep(at(16));
        assert_eq!(expired.into_iter().collect::<Vec<_>>(), vec![key("1")]);
        assert_eq!(
            windows.expiry(&EntityKey::Watch("NIFTY".to_string())),
            Some(at(20))
        );
    }
}
