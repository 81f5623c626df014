//! # `kanshi-notify` - 声音提醒
//!
//! - `audio`：`AudioNotifier`，单飞的提醒音闸门。
//! - `synth`：按 `ToneProfile` 合成带脉动包络的连续音。
//! - `player`：`TonePlayer` 的实现；扬声器输出需要启用 `speaker` feature。

pub mod audio;
pub mod player;
pub mod synth;
