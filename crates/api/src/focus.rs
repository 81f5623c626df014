use chrono::{DateTime, Utc};
use kanshi_core::alert::entity::EntityKey;
use kanshi_core::common::time::TimeProvider;
use kanshi_core::notify::port::FocusSink;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// 一次焦点跳转请求
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusEvent {
    // 单调递增，前端据此保证每次请求只跳转一次
    pub sequence: u64,
    pub target: Option<EntityKey>,
    pub emitted_at: Option<DateTime<Utc>>,
}

/// # Summary
/// 基于 `watch` 通道的焦点协作者，保存最近一次跳转请求。
///
/// # Invariants
/// - 每次 `focus` 调用 `sequence` 恰好加一。
pub struct FocusChannel {
    tx: watch::Sender<FocusEvent>,
    clock: Arc<dyn TimeProvider>,
}

impl FocusChannel {
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        let (tx, _) = watch::channel(FocusEvent::default());
        Self { tx, clock }
    }

    pub fn latest(&self) -> FocusEvent {
        self.tx.borrow().clone()
    }
}

impl FocusSink for FocusChannel {
    fn focus(&self, key: &EntityKey) {
        let now = self.clock.now();
        self.tx.send_modify(|event| {
            event.sequence += 1;
            event.target = Some(key.clone());
            event.emitted_at = Some(now);
        });
        debug!("Focus requested: {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanshi_core::common::time::FakeClockProvider;

    #[test]
    fn test_sequence_increments_per_request() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let channel = FocusChannel::new(Arc::new(FakeClockProvider::new(start)));
        assert_eq!(channel.latest().sequence, 0);

        let key = EntityKey::Signal("3".to_string());
        channel.focus(&key);
        channel.focus(&key);

        let event = channel.latest();
        assert_eq!(event.sequence, 2);
        assert_eq!(event.target, Some(key));
        assert_eq!(event.emitted_at, Some(start));
    }
}
