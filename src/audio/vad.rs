//! Voice activity gating for packed segments.
//!
//! The gate answers one question per candidate segment: does it contain
//! speech worth transcribing? Two strategies are supported:
//!
//! - Frame-based: an injected [`FrameClassifier`] labels fixed-size
//!   frames and the gate accepts the segment when the speech-frame
//!   ratio clears an aggressiveness-keyed threshold.
//! - RMS-only: with no classifier, the whole-segment RMS (raw 16-bit
//!   scale) is compared against an aggressiveness-keyed threshold.
//!
//! A classifier error on one frame downgrades that frame to the RMS
//! check rather than failing the whole segment.

use crate::defaults;
use crate::error::Result;

/// Per-frame speech classifier, typically backed by a dedicated VAD
/// library or model.
pub trait FrameClassifier: Send {
    /// Classifies one frame of 16-bit PCM as speech or not.
    ///
    /// Frames are `frame_ms` milliseconds long; classifiers that only
    /// accept 10/20/30 ms frames should be configured to match.
    fn is_speech_frame(&mut self, frame: &[i16], sample_rate: u32) -> Result<bool>;
}

/// Segment-level speech gate.
pub struct VoiceActivityGate {
    aggressiveness: u8,
    frame_ms: u32,
    classifier: Option<Box<dyn FrameClassifier>>,
}

impl VoiceActivityGate {
    /// Creates an RMS-only gate.
    ///
    /// Aggressiveness above 3 is clamped to 3.
    pub fn new(aggressiveness: u8) -> Self {
        Self {
            aggressiveness: aggressiveness.min(3),
            frame_ms: defaults::VAD_FRAME_MS,
            classifier: None,
        }
    }

    /// Creates a frame-based gate using the given classifier.
    pub fn with_classifier(aggressiveness: u8, classifier: Box<dyn FrameClassifier>) -> Self {
        Self {
            aggressiveness: aggressiveness.min(3),
            frame_ms: defaults::VAD_FRAME_MS,
            classifier: Some(classifier),
        }
    }

    /// Overrides the frame size in milliseconds.
    pub fn with_frame_ms(mut self, frame_ms: u32) -> Self {
        self.frame_ms = frame_ms;
        self
    }

    /// Returns the configured aggressiveness (0..=3).
    pub fn aggressiveness(&self) -> u8 {
        self.aggressiveness
    }

    /// Decides whether a segment contains speech.
    ///
    /// Empty segments never count as speech.
    pub fn is_speech(&mut self, samples: &[i16], sample_rate: u32) -> bool {
        if samples.is_empty() {
            return false;
        }

        let rms_threshold = defaults::VAD_RMS_THRESHOLDS[self.aggressiveness as usize];

        match self.classifier {
            Some(ref mut classifier) => {
                let frame_len =
                    ((self.frame_ms as f64 / 1000.0) * sample_rate as f64).max(1.0) as usize;
                let mut frames = 0usize;
                let mut speech_frames = 0usize;

                for frame in samples.chunks_exact(frame_len) {
                    frames += 1;
                    let speech = match classifier.is_speech_frame(frame, sample_rate) {
                        Ok(speech) => speech,
                        // Single-frame failure falls back to the RMS check.
                        Err(_) => rms_raw(frame) > rms_threshold,
                    };
                    if speech {
                        speech_frames += 1;
                    }
                }

                if frames == 0 {
                    // Shorter than one frame: insufficient data, not silence,
                    // but still nothing a frame classifier can accept.
                    return false;
                }

                let ratio = speech_frames as f32 / frames as f32;
                ratio >= defaults::VAD_RATIO_THRESHOLDS[self.aggressiveness as usize]
            }
            None => rms_raw(samples) > rms_threshold,
        }
    }
}

/// RMS of samples on the raw 16-bit scale (0..=32767), matching the
/// silence and speech thresholds used throughout the packer.
pub fn rms_raw(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let s = sample as f64;
            s * s
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransvoxError;

    /// Classifier returning a scripted sequence of frame verdicts.
    struct ScriptedClassifier {
        verdicts: Vec<Result<bool>>,
        index: usize,
    }

    impl ScriptedClassifier {
        fn new(verdicts: Vec<Result<bool>>) -> Self {
            Self { verdicts, index: 0 }
        }
    }

    impl FrameClassifier for ScriptedClassifier {
        fn is_speech_frame(&mut self, _frame: &[i16], _sample_rate: u32) -> Result<bool> {
            let verdict = match self.verdicts.get_mut(self.index) {
                Some(v) => std::mem::replace(v, Ok(false)),
                None => Ok(false),
            };
            self.index += 1;
            verdict
        }
    }

    fn frames_of(verdict_count: usize, amplitude: i16) -> Vec<i16> {
        // 30ms frames at 16kHz = 480 samples each.
        vec![amplitude; verdict_count * 480]
    }

    #[test]
    fn test_empty_segment_is_not_speech() {
        let mut gate = VoiceActivityGate::new(2);
        assert!(!gate.is_speech(&[], 16000));
    }

    #[test]
    fn test_rms_raw_scale() {
        assert_eq!(rms_raw(&[0i16; 100]), 0.0);
        let rms = rms_raw(&[1000i16; 100]);
        assert!((rms - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_rms_only_gate_uses_aggressiveness_table() {
        // Constant 20 has RMS 20: above level-3 threshold (12), below
        // level-0 threshold (35).
        let samples = vec![20i16; 1600];
        assert!(VoiceActivityGate::new(3).is_speech(&samples, 16000));
        assert!(!VoiceActivityGate::new(0).is_speech(&samples, 16000));
    }

    #[test]
    fn test_aggressiveness_clamped_to_three() {
        let gate = VoiceActivityGate::new(9);
        assert_eq!(gate.aggressiveness(), 3);
    }

    #[test]
    fn test_frame_gate_accepts_on_ratio() {
        // 4 frames, 2 speech: ratio 0.5 >= 0.25 at aggressiveness 2.
        let classifier = ScriptedClassifier::new(vec![Ok(true), Ok(false), Ok(true), Ok(false)]);
        let mut gate = VoiceActivityGate::with_classifier(2, Box::new(classifier));
        assert!(gate.is_speech(&frames_of(4, 100), 16000));
    }

    #[test]
    fn test_frame_gate_rejects_below_ratio() {
        // 4 frames, 1 speech: ratio 0.25 < 0.60 at aggressiveness 0.
        let classifier = ScriptedClassifier::new(vec![Ok(true), Ok(false), Ok(false), Ok(false)]);
        let mut gate = VoiceActivityGate::with_classifier(0, Box::new(classifier));
        assert!(!gate.is_speech(&frames_of(4, 100), 16000));
    }

    #[test]
    fn test_frame_error_falls_back_to_rms() {
        // Both frames error; amplitude 100 has RMS 100 > 18, so both
        // fall back to speech at aggressiveness 2 (ratio 1.0).
        let err = || TransvoxError::VoiceActivity {
            message: "frame rejected".to_string(),
        };
        let classifier = ScriptedClassifier::new(vec![Err(err()), Err(err())]);
        let mut gate = VoiceActivityGate::with_classifier(2, Box::new(classifier));
        assert!(gate.is_speech(&frames_of(2, 100), 16000));
    }

    #[test]
    fn test_segment_shorter_than_frame_is_rejected() {
        let classifier = ScriptedClassifier::new(vec![]);
        let mut gate = VoiceActivityGate::with_classifier(2, Box::new(classifier));
        // 100 samples < 480-sample frame: rejected even though loud.
        assert!(!gate.is_speech(&[500i16; 100], 16000));
    }
}
