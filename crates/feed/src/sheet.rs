use async_trait::async_trait;
use kanshi_core::config::SourceConfig;
use kanshi_core::sheet::entity::Snapshot;
use kanshi_core::sheet::error::SourceError;
use kanshi_core::sheet::port::SnapshotSource;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("kanshi/", env!("CARGO_PKG_VERSION"));

/// # Summary
/// 通过 HTTP 下载表格导出 JSON 的快照数据源。
///
/// # Invariants
/// - 每次调用都是一次完整的 GET，不做增量抓取。
/// - 请求带 `Cache-Control: no-cache`，避免中间层返回旧数据。
#[derive(Clone)]
pub struct SheetSource {
    client: Client,
    url: String,
}

impl SheetSource {
    /// # Summary
    /// 创建数据源。
    ///
    /// # Logic
    /// 1. 设置固定的 User-Agent 与禁用缓存的请求头。
    /// 2. 设置整体超时。
    ///
    /// # Arguments
    /// * `url`: 表格导出的 JSON 地址。
    /// * `timeout`: 单次请求超时。
    ///
    /// # Returns
    /// HTTP 客户端无法构建时返回 `SourceError::Unknown`。
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for SheetSource {
    /// # Summary
    /// 下载并解析一份完整快照。
    ///
    /// # Logic
    /// 1. 发起 GET 请求，连接或超时错误映射为 `Network`。
    /// 2. 非 2xx 状态映射为 `Status`。
    /// 3. 读取完整响应体后再解析，JSON 不合法映射为 `Parse`。
    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let snapshot: Snapshot =
            serde_json::from_slice(&body).map_err(|e| SourceError::Parse(e.to_string()))?;
        debug!(
            "Fetched snapshot: {} signals, {} watchlist entries",
            snapshot.signals.len(),
            snapshot.watchlist.len()
        );
        Ok(snapshot)
    }
}
