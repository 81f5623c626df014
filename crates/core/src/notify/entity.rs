use crate::alert::entity::Urgency;
use serde::Serialize;
use std::time::Duration;

/// 提示音波形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Waveform {
    // 柔和的正弦波
    Sine,
    // 尖锐的方波
    Square,
    // 带明显泛音的锯齿波
    Sawtooth,
}

/// # Summary
/// 一种提示音的音色参数。
///
/// # Invariants
/// - `pulse_period` 决定脉动包络周期，频率与音量都按该周期缓慢起伏。
/// - `freq_depth` 与 `amp_depth` 取值范围 `[0, 1)`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToneProfile {
    // 紧急程度
    pub urgency: Urgency,
    // 基础频率 (Hz)
    pub base_hz: f32,
    pub waveform: Waveform,
    // 输出增益
    pub gain: f32,
    // 脉动周期
    pub pulse_period: Duration,
    // 频率调制深度 (相对基础频率的比例)
    pub freq_depth: f32,
    // 振幅调制深度
    pub amp_depth: f32,
}

impl ToneProfile {
    /// # Summary
    /// 根据紧急程度选择音色。
    ///
    /// # Logic
    /// - `Critical`：高音方波，最刺耳。
    /// - `Overnight`：低音锯齿波，同样尖锐但更沉。
    /// - `Normal`：中音正弦波，柔和。
    ///
    /// 三者共用约 0.5 秒的脉动周期。
    pub fn for_urgency(urgency: Urgency) -> Self {
        let pulse_period = Duration::from_millis(500);
        match urgency {
            Urgency::Critical => Self {
                urgency,
                base_hz: 1046.5,
                waveform: Waveform::Square,
                gain: 0.22,
                pulse_period,
                freq_depth: 0.08,
                amp_depth: 0.6,
            },
            Urgency::Overnight => Self {
                urgency,
                base_hz: 329.6,
                waveform: Waveform::Sawtooth,
                gain: 0.25,
                pulse_period,
                freq_depth: 0.06,
                amp_depth: 0.5,
            },
            Urgency::Normal => Self {
                urgency,
                base_hz: 659.3,
                waveform: Waveform::Sine,
                gain: 0.3,
                pulse_period,
                freq_depth: 0.03,
                amp_depth: 0.4,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_distinct() {
        let critical = ToneProfile::for_urgency(Urgency::Critical);
        let overnight = ToneProfile::for_urgency(Urgency::Overnight);
        let normal = ToneProfile::for_urgency(Urgency::Normal);

        assert!(critical.base_hz > normal.base_hz);
        assert!(overnight.base_hz < normal.base_hz);
        assert_ne!(critical.waveform, overnight.waveform);
        assert_eq!(normal.waveform, Waveform::Sine);
        assert_eq!(critical.pulse_period, Duration::from_millis(500));
    }
}
