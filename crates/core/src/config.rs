use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub sync: SyncConfig,
    pub audio: AudioConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// 远端表格数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    // 表格导出的 JSON 地址
    pub url: String,
    pub timeout_secs: u64,
}

/// 轮询与提醒窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_secs: u64,
    pub sweep_interval_secs: u64,
    pub alert_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    // 关闭后不创建音频设备，只保留焦点跳转
    pub enabled: bool,
    // 启动时是否静音
    pub muted: bool,
    pub tone_duration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    // 日志文件目录，为空时只输出到标准输出
    pub dir: Option<String>,
    pub file_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 8,
            sweep_interval_secs: 1,
            alert_window_secs: 15,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            muted: false,
            tone_duration_secs: 15,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: "kanshi.log".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn alert_window(&self) -> Duration {
        Duration::from_secs(self.alert_window_secs)
    }
}

impl AudioConfig {
    pub fn tone_duration(&self) -> Duration {
        Duration::from_secs(self.tone_duration_secs)
    }
}

/// 配置校验错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid setting {0}: {1}")]
    Invalid(&'static str, String),
}

impl AppConfig {
    /// # Summary
    /// 校验配置的一致性。
    ///
    /// # Logic
    /// 1. 数据源地址不能为空。
    /// 2. 所有时间间隔必须大于 0。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回第一个发现的 `ConfigError`。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.url.trim().is_empty() {
            return Err(ConfigError::Missing("source.url"));
        }
        let intervals = [
            ("source.timeout_secs", self.source.timeout_secs),
            ("sync.poll_interval_secs", self.sync.poll_interval_secs),
            ("sync.sweep_interval_secs", self.sync.sweep_interval_secs),
            ("sync.alert_window_secs", self.sync.alert_window_secs),
            ("audio.tone_duration_secs", self.audio.tone_duration_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Invalid(name, "must be greater than 0".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(8));
        assert_eq!(config.sync.sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.sync.alert_window(), Duration::from_secs(15));
        assert_eq!(config.audio.tone_duration(), Duration::from_secs(15));
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_url_and_zero_interval() {
        let mut config = AppConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::Missing("source.url")));

        config.source.url = "https://example.com/sheet.json".to_string();
        assert_eq!(config.validate(), Ok(()));

        config.sync.poll_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid("sync.poll_interval_secs", _))
        ));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"sync": {"poll_interval_secs": 5}}"#).unwrap();
        assert_eq!(config.sync.poll_interval_secs, 5);
        assert_eq!(config.sync.alert_window_secs, 15);
        assert_eq!(config.server.port, 8080);
    }
}
