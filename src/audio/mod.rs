//! Audio capture, buffering, metering and voice-activity gating.

pub mod capture;
#[cfg(feature = "cpal-audio")]
pub mod cpal_source;
pub mod level;
pub mod ring;
pub mod vad;
pub mod wav;

pub use capture::{CaptureFeed, CaptureSource, ScriptedCaptureSource};
#[cfg(feature = "cpal-audio")]
pub use cpal_source::MicCaptureSource;
pub use level::LevelMeter;
pub use ring::RingAudioBuffer;
pub use vad::{FrameClassifier, VoiceActivityGate};
pub use wav::WavCaptureSource;
