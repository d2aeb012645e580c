//! Input level metering.

use crate::defaults;
use std::sync::atomic::{AtomicU32, Ordering};

/// Lock-free audio level gauge shared between the capture thread and
/// any observer (UI, logging).
///
/// The capture thread calls [`update`](LevelMeter::update) per block;
/// observers read [`level`](LevelMeter::level) at their own rate. The
/// value is the block RMS scaled by a speech-tuned gain and clamped to
/// `[0.0, 1.0]`.
#[derive(Debug, Default)]
pub struct LevelMeter {
    bits: AtomicU32,
}

impl LevelMeter {
    /// Creates a meter reading 0.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the meter from one capture block and returns the new level.
    pub fn update(&self, block: &[i16]) -> f32 {
        let level = compute_level(block);
        self.bits.store(level.to_bits(), Ordering::Relaxed);
        level
    }

    /// Most recently computed level in `[0.0, 1.0]`.
    pub fn level(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Resets the meter to 0.0.
    pub fn reset(&self) {
        self.bits.store(0.0f32.to_bits(), Ordering::Relaxed);
    }
}

/// Computes the displayed level for a block: normalized RMS scaled by
/// [`defaults::LEVEL_GAIN`], clamped to 1.0.
pub fn compute_level(block: &[i16]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = block
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let rms = (sum_squares / block.len() as f64).sqrt() as f32;
    (rms * defaults::LEVEL_GAIN).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_reads_zero() {
        let meter = LevelMeter::new();
        assert_eq!(meter.update(&[0i16; 1000]), 0.0);
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn test_empty_block_reads_zero() {
        assert_eq!(compute_level(&[]), 0.0);
    }

    #[test]
    fn test_full_scale_clamps_to_one() {
        let meter = LevelMeter::new();
        let level = meter.update(&[i16::MAX; 1000]);
        assert_eq!(level, 1.0);
        assert_eq!(meter.level(), 1.0);
    }

    #[test]
    fn test_quiet_speech_scales_by_gain() {
        // RMS of constant 1000 is 1000/32767 ~= 0.0305; x15 ~= 0.458.
        let level = compute_level(&[1000i16; 1000]);
        assert!(level > 0.44 && level < 0.47, "got {}", level);
    }

    #[test]
    fn test_level_never_exceeds_one() {
        for amplitude in [100i16, 3000, 10000, i16::MAX] {
            let level = compute_level(&[amplitude; 500]);
            assert!((0.0..=1.0).contains(&level));
        }
    }

    #[test]
    fn test_reset() {
        let meter = LevelMeter::new();
        meter.update(&[5000i16; 100]);
        assert!(meter.level() > 0.0);
        meter.reset();
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn test_update_overwrites_previous() {
        let meter = LevelMeter::new();
        meter.update(&[i16::MAX; 100]);
        meter.update(&[0i16; 100]);
        assert_eq!(meter.level(), 0.0);
    }
}
