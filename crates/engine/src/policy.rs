use crate::diff::DiffResult;
use kanshi_core::alert::entity::{EntityKey, Urgency};
use serde::Serialize;

/// 一个轮询周期的提醒决策
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub should_alert: bool,
    pub urgency: Urgency,
    // 需要滚动定位的信号
    pub focus_target: Option<EntityKey>,
}

/// # Summary
/// 根据差异结果决定是否提醒以及提醒的紧急程度。
///
/// # Logic
/// 1. 首次加载 (`initial`) 永远不提醒。
/// 2. 有任何变化才提醒。
/// 3. 紧急程度按优先级取最高：止损 `Critical` > 隔夜 `Overnight` > `Normal`。
/// 4. 焦点目标为最近变化的信号，与是否发声无关。
pub fn decide(diff: &DiffResult, initial: bool) -> Decision {
    if initial {
        return Decision::default();
    }

    let urgency = if diff.critical_status_transition {
        Urgency::Critical
    } else if diff.overnight_transition {
        Urgency::Overnight
    } else {
        Urgency::Normal
    };

    Decision {
        should_alert: diff.has_changes(),
        urgency,
        focus_target: diff.latest_changed_key.clone(),
    }
}
