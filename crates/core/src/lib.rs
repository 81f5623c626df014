//! # `kanshi-core` - 领域模型与端口定义
//!
//! 本 crate 不包含任何 I/O 实现，只定义：
//! - 表格快照的领域实体 (`Signal`、`WatchlistEntry`、`Snapshot`)
//! - 提醒相关的值对象 (`EntityKey`、`ChangeSet`、`Urgency`)
//! - 外部协作者的端口 (`SnapshotSource`、`TonePlayer`、`FocusSink`)
//! - 各领域的错误类型、时钟抽象与全局配置

pub mod alert;
pub mod common;
pub mod config;
pub mod notify;
pub mod sheet;

#[cfg(feature = "test-utils")]
pub mod test_utils;
