use config::{Config, Environment, File, Source};
use kanshi_core::config::AppConfig;
use thiserror::Error;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "KANSHI_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "kanshi";
const ENV_PREFIX: &str = "KANSHI";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error(transparent)]
    Invalid(#[from] kanshi_core::config::ConfigError),
}

/// # Summary
/// 加载全局配置。
///
/// # Logic
/// 优先级由低到高：
/// 1. 代码内默认值 (`#[serde(default)]`)。
/// 2. 配置文件：`KANSHI_CONFIG` 指定的路径 (必须存在)，否则可选的 `kanshi.toml`。
/// 3. `KANSHI__` 前缀的环境变量，例如 `KANSHI__SOURCE__URL`。
///
/// # Returns
/// 通过校验的配置。
pub fn load() -> Result<AppConfig, SettingsError> {
    let file = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => File::with_name(&path).required(true),
        Err(_) => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };
    load_from(file, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn load_from<S>(file: S, env: Environment) -> Result<AppConfig, SettingsError>
where
    S: Source + Send + Sync + 'static,
{
    let config: AppConfig = Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::time::Duration;

    fn toml(text: &'static str) -> impl Source + Send + Sync + 'static {
        File::from_str(text, FileFormat::Toml)
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = load_from(
            toml(
                r#"
                [source]
                url = "https://example.com/sheet.json"

                [sync]
                poll_interval_secs = 5
                "#,
            ),
            env(&[]),
        )
        .unwrap();

        assert_eq!(config.source.url, "https://example.com/sheet.json");
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.sync.alert_window(), Duration::from_secs(15));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = load_from(
            toml(
                r#"
                [source]
                url = "https://example.com/a.json"
                "#,
            ),
            env(&[
                ("KANSHI__SOURCE__URL", "https://example.com/b.json"),
                ("KANSHI__SERVER__PORT", "9090"),
                ("KANSHI__AUDIO__MUTED", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.source.url, "https://example.com/b.json");
        assert_eq!(config.server.port, 9090);
        assert!(config.audio.muted);
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let result = load_from(toml(""), env(&[]));
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }
}
