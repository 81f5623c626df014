//! # `kanshi-engine` - 同步、差异与提醒引擎
//!
//! - `diff` / `alert` / `policy` / `state`：纯逻辑核心，不涉及计时器与 I/O。
//! - `sync`：持有全部计时器的调度外壳，负责轮询、清扫、单飞与拆除。

pub mod alert;
pub mod diff;
pub mod policy;
pub mod state;
pub mod sync;
