mod logging;
mod settings;

use std::sync::Arc;

use kanshi_api::focus::FocusChannel;
use kanshi_api::server::{AppState, start_server};
use kanshi_core::common::time::{RealTimeProvider, TimeProvider};
use kanshi_core::config::AudioConfig;
use kanshi_core::notify::port::TonePlayer;
use kanshi_engine::sync::{SyncEngine, SyncSettings};
use kanshi_feed::sheet::SheetSource;
use kanshi_notify::audio::AudioNotifier;
use kanshi_notify::player::NullTonePlayer;
use tracing::{error, info, warn};

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 SyncEngine。
///
/// # Logic
/// 1. 加载配置并初始化全局日志。
/// 2. 实例化基础设施层（数据源、音频输出、焦点通道）。
/// 3. 构造同步引擎并启动定时器。
/// 4. 启动 HTTP 服务，收到退出信号后优雅停机并拆除引擎。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let config = settings::load()?;
    let _log_guard = logging::init_logging(&config.logging);
    info!("Kanshi starting...");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("TLS crypto provider was already installed");
    }

    // 2. 基础设施层
    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);
    let source = Arc::new(SheetSource::from_config(&config.source)?);
    info!("Polling sheet at {}", source.url());

    let notifier = Arc::new(AudioNotifier::new(
        build_player(&config.audio),
        config.audio.tone_duration(),
        config.audio.muted,
    ));
    let focus = Arc::new(FocusChannel::new(clock.clone()));

    // 3. 同步引擎
    let engine = SyncEngine::new(
        source,
        notifier,
        focus.clone(),
        clock,
        SyncSettings::from(&config.sync),
    );
    engine.start();

    // 4. HTTP 服务，挂起直到退出信号
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        engine: engine.clone(),
        focus,
    };
    let served = start_server(state, &bind_addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await;

    info!("Shutdown signal received. Stopping...");
    engine.shutdown().await;
    served
}

/// 根据配置选择音频输出，设备不可用时退化为静默输出
fn build_player(audio: &AudioConfig) -> Arc<dyn TonePlayer> {
    if !audio.enabled {
        info!("Audio alerts disabled by configuration");
        return Arc::new(NullTonePlayer);
    }
    speaker_player().unwrap_or_else(|| Arc::new(NullTonePlayer))
}

#[cfg(feature = "speaker")]
fn speaker_player() -> Option<Arc<dyn TonePlayer>> {
    match kanshi_notify::player::RodioTonePlayer::spawn() {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            warn!("Audio output unavailable, alerts will be silent: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "speaker"))]
fn speaker_player() -> Option<Arc<dyn TonePlayer>> {
    warn!("Built without the `speaker` feature, alerts will be silent");
    None
}
