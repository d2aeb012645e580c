//! Speech engine seam.
//!
//! The pipeline does not ship a recognition model; callers inject one
//! behind [`SpeechEngine`]. This keeps the crate buildable and testable
//! without model weights, and lets applications choose local or remote
//! engines.

use crate::error::{Result, TransvoxError};
use crate::types::AudioSegment;

/// A single recognition result from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// The recognized text, possibly empty for pure noise.
    pub text: String,
    /// Detected language code.
    pub language: String,
    /// Engine confidence in [0,1].
    pub confidence: f32,
}

/// Trait for speech recognition engines.
///
/// Implementations are called from the worker thread and should be
/// internally synchronized if they share state.
pub trait SpeechEngine: Send {
    /// Transcribes one audio segment.
    ///
    /// An empty `text` means the engine heard nothing recognizable; it
    /// is not an error.
    fn transcribe(&mut self, segment: &AudioSegment) -> Result<Transcription>;
}

/// Mock speech engine for testing.
///
/// Returns scripted transcriptions in order, then repeats the last one.
pub struct MockSpeechEngine {
    responses: Vec<Transcription>,
    index: usize,
    should_fail: bool,
    error_message: String,
    call_count: usize,
}

impl MockSpeechEngine {
    /// Create a mock engine that answers "hello" to everything.
    pub fn new() -> Self {
        Self {
            responses: vec![Transcription {
                text: "hello".to_string(),
                language: "en".to_string(),
                confidence: 0.9,
            }],
            index: 0,
            should_fail: false,
            error_message: "mock transcription error".to_string(),
            call_count: 0,
        }
    }

    /// Configure scripted responses, returned in order.
    pub fn with_responses(mut self, responses: Vec<Transcription>) -> Self {
        self.responses = responses;
        self
    }

    /// Convenience: script plain-text responses in English.
    pub fn with_texts(self, texts: &[&str]) -> Self {
        self.with_responses(
            texts
                .iter()
                .map(|t| Transcription {
                    text: t.to_string(),
                    language: "en".to_string(),
                    confidence: 0.9,
                })
                .collect(),
        )
    }

    /// Configure the mock to fail every call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of transcribe calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count
    }
}

impl Default for MockSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn transcribe(&mut self, _segment: &AudioSegment) -> Result<Transcription> {
        self.call_count += 1;
        if self.should_fail {
            return Err(TransvoxError::Transcription {
                message: self.error_message.clone(),
            });
        }
        let response = self
            .responses
            .get(self.index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or(Transcription {
                text: String::new(),
                language: "en".to_string(),
                confidence: 0.0,
            });
        if self.index + 1 < self.responses.len() {
            self.index += 1;
        }
        Ok(response)
    }
}
