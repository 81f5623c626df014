use kanshi_core::notify::entity::{ToneProfile, Waveform};
use std::f32::consts::TAU;

/// 输出采样率 (Hz)
pub const SAMPLE_RATE: u32 = 44_100;
const SAMPLE_RATE_HZ: f32 = 44_100.0;

/// # Summary
/// 无限长的单声道提示音发生器。
///
/// # Invariants
/// - 输出样本的绝对值不超过 `profile.gain`。
/// - 频率与振幅随同一个脉动包络起伏，包络周期为 `profile.pulse_period`。
///
/// # Logic
/// 包络 `lfo = (1 - cos(2π·φ)) / 2`，φ 为脉动相位：
/// - 频率 `f = base · (1 + freq_depth · (2·lfo - 1))`
/// - 振幅 `a = gain · (1 - amp_depth · (1 - lfo))`
#[derive(Debug, Clone)]
pub struct ToneSynth {
    profile: ToneProfile,
    // 振荡器相位，范围 [0, 1)
    phase: f32,
    // 脉动相位，范围 [0, 1)
    pulse_phase: f32,
    pulse_step: f32,
}

impl ToneSynth {
    pub fn new(profile: ToneProfile) -> Self {
        let pulse_secs = profile.pulse_period.as_secs_f32();
        let pulse_step = if pulse_secs > 0.0 {
            1.0 / (pulse_secs * SAMPLE_RATE_HZ)
        } else {
            0.0
        };
        Self {
            profile,
            phase: 0.0,
            pulse_phase: 0.0,
            pulse_step,
        }
    }

    pub fn profile(&self) -> &ToneProfile {
        &self.profile
    }

    fn envelope(&self) -> f32 {
        0.5 * (1.0 - (TAU * self.pulse_phase).cos())
    }

    fn oscillator(&self) -> f32 {
        match self.profile.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
        }
    }
}

impl Iterator for ToneSynth {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let lfo = self.envelope();
        let p = &self.profile;
        let amplitude = p.gain * (1.0 - p.amp_depth * (1.0 - lfo));
        let frequency = p.base_hz * (1.0 + p.freq_depth * (2.0 * lfo - 1.0));

        let sample = amplitude * self.oscillator();

        self.phase = (self.phase + frequency / SAMPLE_RATE_HZ).fract();
        self.pulse_phase = (self.pulse_phase + self.pulse_step).fract();
        Some(sample)
    }
}

#[cfg(feature = "speaker")]
impl rodio::Source for ToneSynth {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> rodio::ChannelCount {
        1
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}
