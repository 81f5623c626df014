use async_trait::async_trait;
use kanshi_core::notify::entity::ToneProfile;
use kanshi_core::notify::error::AudioError;
use kanshi_core::notify::port::TonePlayer;
use tracing::debug;

/// 静默输出，用于关闭音频或没有扬声器的环境
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTonePlayer;

#[async_trait]
impl TonePlayer for NullTonePlayer {
    async fn resume(&self) -> Result<(), AudioError> {
        Ok(())
    }

    async fn play_tone(&self, profile: &ToneProfile) -> Result<(), AudioError> {
        debug!("Audio output disabled, skipping {} tone", profile.urgency);
        Ok(())
    }

    async fn stop_tone(&self) {}
}

#[cfg(feature = "speaker")]
pub use speaker::RodioTonePlayer;

#[cfg(feature = "speaker")]
mod speaker {
    use crate::synth::ToneSynth;
    use async_trait::async_trait;
    use kanshi_core::notify::entity::ToneProfile;
    use kanshi_core::notify::error::AudioError;
    use kanshi_core::notify::port::TonePlayer;
    use rodio::{OutputStream, OutputStreamBuilder, Sink};
    use std::sync::mpsc;
    use tokio::sync::oneshot;
    use tracing::{debug, info, warn};

    enum Command {
        Resume(oneshot::Sender<Result<(), AudioError>>),
        Play(ToneProfile, oneshot::Sender<Result<(), AudioError>>),
        Stop(oneshot::Sender<()>),
    }

    /// # Summary
    /// 基于 `rodio` 的扬声器输出。
    ///
    /// # Invariants
    /// - 输出设备由专用线程独占，异步侧只通过命令通道与其交互。
    /// - 设备在首次 `resume` 时才打开；打开失败视为"挂起"，下次 `resume` 重试。
    /// - 句柄全部释放后命令通道关闭，音频线程随之退出并释放设备。
    pub struct RodioTonePlayer {
        commands: mpsc::Sender<Command>,
    }

    impl RodioTonePlayer {
        /// # Summary
        /// 启动音频线程。
        ///
        /// # Returns
        /// 线程无法创建时返回 `AudioError::Unavailable`。
        pub fn spawn() -> Result<Self, AudioError> {
            let (tx, rx) = mpsc::channel();
            std::thread::Builder::new()
                .name("kanshi-audio".to_string())
                .spawn(move || run(rx))
                .map_err(|e| AudioError::Unavailable(e.to_string()))?;
            Ok(Self { commands: tx })
        }

        fn send(&self, command: Command) -> Result<(), AudioError> {
            self.commands
                .send(command)
                .map_err(|_| AudioError::Unavailable("audio thread exited".to_string()))
        }
    }

    #[async_trait]
    impl TonePlayer for RodioTonePlayer {
        async fn resume(&self) -> Result<(), AudioError> {
            let (tx, rx) = oneshot::channel();
            self.send(Command::Resume(tx))?;
            rx.await
                .map_err(|_| AudioError::Unavailable("audio thread exited".to_string()))?
        }

        async fn play_tone(&self, profile: &ToneProfile) -> Result<(), AudioError> {
            let (tx, rx) = oneshot::channel();
            self.send(Command::Play(profile.clone(), tx))?;
            rx.await
                .map_err(|_| AudioError::Unavailable("audio thread exited".to_string()))?
        }

        async fn stop_tone(&self) {
            let (tx, rx) = oneshot::channel();
            if self.send(Command::Stop(tx)).is_err() {
                return;
            }
            if rx.await.is_err() {
                debug!("Audio thread dropped stop acknowledgement");
            }
        }
    }

    fn run(commands: mpsc::Receiver<Command>) {
        info!("Audio thread started");
        let mut stream: Option<OutputStream> = None;
        let mut sink: Option<Sink> = None;

        while let Ok(command) = commands.recv() {
            match command {
                Command::Resume(reply) => {
                    let result = if stream.is_some() {
                        Ok(())
                    } else {
                        match OutputStreamBuilder::open_default_stream() {
                            Ok(opened) => {
                                info!("Audio output device opened");
                                stream = Some(opened);
                                Ok(())
                            }
                            Err(e) => {
                                warn!("Audio output device unavailable: {}", e);
                                Err(AudioError::Suspended(e.to_string()))
                            }
                        }
                    };
                    if reply.send(result).is_err() {
                        debug!("Resume caller went away");
                    }
                }
                Command::Play(profile, reply) => {
                    let result = match &stream {
                        Some(output) => {
                            if let Some(previous) = sink.take() {
                                previous.stop();
                            }
                            let next = Sink::connect_new(output.mixer());
                            next.append(ToneSynth::new(profile));
                            sink = Some(next);
                            Ok(())
                        }
                        None => Err(AudioError::Suspended(
                            "output device not resumed".to_string(),
                        )),
                    };
                    if reply.send(result).is_err() {
                        debug!("Play caller went away");
                    }
                }
                Command::Stop(reply) => {
                    if let Some(current) = sink.take() {
                        current.stop();
                    }
                    if reply.send(()).is_err() {
                        debug!("Stop caller went away");
                    }
                }
            }
        }
        info!("Audio thread exited");
    }
}
