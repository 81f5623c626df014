//! 测试替身，供各 crate 的集成测试使用 (`test-utils` feature)。

use crate::alert::entity::{EntityKey, Urgency};
use crate::notify::entity::ToneProfile;
use crate::notify::error::AudioError;
use crate::notify::port::{AlertNotifier, FocusSink, TonePlayer};
use crate::sheet::entity::Snapshot;
use crate::sheet::error::SourceError;
use crate::sheet::port::SnapshotSource;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// # Summary
/// 按脚本依次返回结果的数据源。
///
/// # Logic
/// - 每次抓取弹出队首结果；脚本耗尽后重复返回最后一次成功的快照。
/// - 若设置了闸门，每次抓取都会先等待一次 `Notify` 许可，用于模拟慢请求。
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Snapshot, String>>>,
    last_ok: Mutex<Option<Snapshot>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带闸门的数据源，返回值中的 `Notify` 每放行一次允许一次抓取完成
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let source = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (source, gate)
    }

    pub fn push_ok(&self, snapshot: Snapshot) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(snapshot));
    }

    pub fn push_err(&self, message: &str) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(message.to_string()));
    }

    /// 已发起的抓取次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Ok(snapshot)) => {
                *self.last_ok.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(Err(message)) => Err(SourceError::Network(message)),
            None => self
                .last_ok
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
                .ok_or_else(|| SourceError::Unknown("script exhausted".to_string())),
        }
    }
}

/// # Summary
/// 记录所有调用的音频输出替身。
#[derive(Default)]
pub struct RecordingTonePlayer {
    played: Mutex<Vec<ToneProfile>>,
    resumes: AtomicUsize,
    stops: AtomicUsize,
    fail_resume: AtomicBool,
    fail_play: AtomicBool,
    resume_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingTonePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟设备挂起且无法恢复
    pub fn set_fail_resume(&self, fail: bool) {
        self.fail_resume.store(fail, Ordering::SeqCst);
    }

    /// 让下一次 `resume` 挂起，直到返回的 `Notify` 放行
    pub fn gate_next_resume(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.resume_gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(gate.clone());
        gate
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    pub fn played(&self) -> Vec<ToneProfile> {
        self.played.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TonePlayer for RecordingTonePlayer {
    async fn resume(&self) -> Result<(), AudioError> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .resume_gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_resume.load(Ordering::SeqCst) {
            return Err(AudioError::Suspended("resume refused".to_string()));
        }
        Ok(())
    }

    async fn play_tone(&self, profile: &ToneProfile) -> Result<(), AudioError> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(AudioError::Playback("play refused".to_string()));
        }
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(profile.clone());
        Ok(())
    }

    async fn stop_tone(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// # Summary
/// 记录焦点请求的替身。
#[derive(Default)]
pub struct RecordingFocusSink {
    targets: Mutex<Vec<EntityKey>>,
}

impl RecordingFocusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<EntityKey> {
        self.targets.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl FocusSink for RecordingFocusSink {
    fn focus(&self, key: &EntityKey) {
        self.targets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.clone());
    }
}

/// # Summary
/// 记录提醒请求的替身，不做单飞控制，便于断言每个周期的决策。
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Urgency>>,
    stops: AtomicUsize,
    muted: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Urgency> {
        self.alerts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn alert(&self, urgency: Urgency) -> bool {
        if self.muted.load(Ordering::SeqCst) {
            return false;
        }
        self.alerts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(urgency);
        true
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    fn toggle_mute(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::SeqCst)
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn is_sounding(&self) -> bool {
        false
    }
}
