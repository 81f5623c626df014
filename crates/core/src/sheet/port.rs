use crate::sheet::entity::Snapshot;
use crate::sheet::error::SourceError;
use async_trait::async_trait;

/// # Summary
/// 远端表格数据源接口 (Port)。
///
/// # Invariants
/// - 每次调用返回一份完整快照，不提供增量或部分抓取。
/// - 实现必须是 `Send` 和 `Sync`，以便被调度器在后台任务中持有。
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// # Summary
    /// 抓取当前完整快照。
    ///
    /// # Logic
    /// 1. 向远端发起一次完整请求。
    /// 2. 将返回内容解析为 `Snapshot`。
    ///
    /// # Returns
    /// 成功返回快照，失败返回 `SourceError`。
    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError>;
}
