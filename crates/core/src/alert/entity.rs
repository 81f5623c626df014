use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// # Summary
/// 被跟踪实体的唯一键。
///
/// # Invariants
/// - 信号以 `id` 标识，自选条目以 `symbol` 标识，两个命名空间互不冲突。
/// - 字符串形式为 `signal:<id>` 或 `watch:<symbol>`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Signal(String),
    Watch(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Signal(id) => write!(f, "signal:{}", id),
            EntityKey::Watch(symbol) => write!(f, "watch:{}", symbol),
        }
    }
}

impl Serialize for EntityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// # Summary
/// 单个实体在一个轮询周期内发生变化的字段名集合 ("高亮")。
///
/// # Invariants
/// - 字段名有序存储，序列化结果稳定。
/// - 空集合代表没有变化，不应出现在变更表中。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeSet<&'static str>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str) -> bool {
        self.0.insert(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<&'static str> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = &'static str>>(iter: I) -> Self {
        ChangeSet(iter.into_iter().collect())
    }
}

/// # Summary
/// 提醒紧急程度。
///
/// # Invariants
/// - 优先级：`Critical` > `Overnight` > `Normal`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[default]
    Normal,
    // 信号触发止损
    Critical,
    // 隔夜持仓信号发生变化
    Overnight,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Normal => write!(f, "NORMAL"),
            Urgency::Critical => write!(f, "CRITICAL"),
            Urgency::Overnight => write!(f, "OVERNIGHT"),
        }
    }
}
