//! Data types flowing through the transcription pipeline.

use std::time::Instant;

/// A bounded, immutable slice of audio ready for transcription.
///
/// Created by the segment packer from a ring-buffer snapshot; consumed
/// exactly once by the transcription worker.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// PCM samples (16-bit signed integers, mono).
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Optional language hint forwarded to the speech engine.
    pub language_hint: Option<String>,
}

impl AudioSegment {
    /// Creates a new audio segment.
    pub fn new(samples: Vec<i16>, sample_rate: u32, language_hint: Option<String>) -> Self {
        Self {
            samples,
            sample_rate,
            language_hint,
        }
    }

    /// Duration of the segment in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A transcription produced by the worker for one accepted segment.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// The transcribed text.
    pub text: String,
    /// Detected (or hinted) language code.
    pub language: String,
    /// Engine confidence in [0,1].
    pub confidence: f32,
    /// When the worker emitted this result.
    pub timestamp: Instant,
}

impl TranscriptionResult {
    /// Creates a new transcription result stamped with the current time.
    pub fn new(text: String, language: String, confidence: f32) -> Self {
        Self {
            text,
            language,
            confidence,
            timestamp: Instant::now(),
        }
    }
}

/// A translation produced asynchronously for a transcription result.
///
/// Correlated to its originating transcription by insertion order, not by
/// id: consumers apply it to the most recently displayed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// The translated text.
    pub translated_text: String,
    /// Language the text was translated from.
    pub source_language: String,
    /// Language the text was translated to.
    pub target_language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_segment_duration() {
        let segment = AudioSegment::new(vec![0i16; 48000], 16000, None);
        assert!((segment.duration_seconds() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_audio_segment_language_hint() {
        let segment = AudioSegment::new(vec![1, 2, 3], 16000, Some("en".to_string()));
        assert_eq!(segment.language_hint.as_deref(), Some("en"));
    }

    #[test]
    fn test_transcription_result_timestamp_is_current() {
        let before = Instant::now();
        let result = TranscriptionResult::new("hello".to_string(), "en".to_string(), 0.9);
        let after = Instant::now();

        assert!(result.timestamp >= before);
        assert!(result.timestamp <= after);
        assert_eq!(result.text, "hello");
        assert_eq!(result.language, "en");
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_translation_result_fields() {
        let result = TranslationResult {
            translated_text: "olá".to_string(),
            source_language: "en".to_string(),
            target_language: "pt".to_string(),
        };
        assert_eq!(result.translated_text, "olá");
        assert_eq!(result.source_language, "en");
        assert_eq!(result.target_language, "pt");
    }
}
