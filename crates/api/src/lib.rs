//! # `kanshi-api` - 看板 HTTP 接口
//!
//! 本 crate 把同步引擎的状态暴露给展示层。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 提供连接状态、高亮、信号与自选列表的只读视图
//! - 接收手动同步、完整重载与静音控制
//! - 通过 `FocusChannel` 把焦点跳转事件交给前端

pub mod error;
pub mod focus;
pub mod routes;
pub mod server;
pub mod types;
