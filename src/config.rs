//! Pipeline configuration.
//!
//! `PipelineConfig` is read-only once the pipeline starts: there is no
//! runtime reconfiguration. Changing a value requires stopping the
//! pipeline and starting a new one with the new configuration.

use crate::defaults;
use crate::error::{Result, TransvoxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete, immutable pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Capture channel count; only the first channel is used.
    pub channels: u16,
    /// Fixed segment duration in seconds, and the packer cadence.
    pub chunk_seconds: f64,
    /// Ring buffer depth in seconds.
    pub buffer_seconds: f64,
    /// Maximum extension past `chunk_seconds` while hunting for a silent
    /// tail, in seconds. Effective budget is never below 1 second.
    pub lookahead_seconds: f64,
    /// Trailing window checked for silence, in milliseconds (floor 20).
    pub tail_check_ms: u32,
    /// RMS threshold (raw 16-bit scale) below which the tail counts as
    /// silent.
    pub silence_threshold: f64,
    /// Minimum whole-segment RMS for a segment to be queued. This coarse
    /// gate is independent of the voice-activity gate below.
    pub speech_rms_threshold: f64,
    /// Whether the voice-activity gate is applied to candidate segments.
    pub vad_enabled: bool,
    /// Voice-activity aggressiveness, 0 (conservative) to 3 (eager).
    pub vad_aggressiveness: u8,
    /// Work queue capacity in segments; segments are dropped, not
    /// blocked, when the queue is full.
    pub queue_capacity: usize,
    /// Optional language hint forwarded to the speech engine.
    pub language_hint: Option<String>,
    /// Whether transcriptions are forwarded to the translation
    /// dispatcher.
    pub translation_enabled: bool,
    /// Target language for translation.
    pub target_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            chunk_seconds: defaults::CHUNK_SECONDS,
            buffer_seconds: defaults::BUFFER_SECONDS,
            lookahead_seconds: defaults::LOOKAHEAD_SECONDS,
            tail_check_ms: defaults::TAIL_CHECK_MS,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            speech_rms_threshold: defaults::SPEECH_RMS_THRESHOLD,
            vad_enabled: false,
            vad_aggressiveness: defaults::VAD_AGGRESSIVENESS,
            queue_capacity: defaults::QUEUE_CAPACITY,
            language_hint: None,
            translation_enabled: false,
            target_language: "en".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransvoxError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                TransvoxError::Io(e)
            }
        })?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file
    /// does not exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(TransvoxError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported variables:
    /// - TRANSVOX_LANGUAGE → language_hint
    /// - TRANSVOX_TARGET_LANGUAGE → target_language
    /// - TRANSVOX_CHUNK_SECONDS → chunk_seconds
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("TRANSVOX_LANGUAGE") {
            if !language.is_empty() {
                self.language_hint = Some(language);
            }
        }

        if let Ok(target) = std::env::var("TRANSVOX_TARGET_LANGUAGE") {
            if !target.is_empty() {
                self.target_language = target;
            }
        }

        if let Ok(chunk) = std::env::var("TRANSVOX_CHUNK_SECONDS") {
            if let Ok(seconds) = chunk.parse::<f64>() {
                self.chunk_seconds = seconds;
            }
        }

        self
    }

    /// Validate the configuration before pipeline start.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.channels == 0 {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "channels".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.chunk_seconds <= 0.0 {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "chunk_seconds".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.buffer_seconds < self.chunk_seconds {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "buffer_seconds".to_string(),
                message: format!(
                    "must be at least chunk_seconds ({})",
                    self.chunk_seconds
                ),
            });
        }
        if self.vad_aggressiveness > 3 {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "vad_aggressiveness".to_string(),
                message: "must be in 0..=3".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "queue_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Number of samples in one fixed-duration segment.
    pub fn required_samples(&self) -> usize {
        (self.chunk_seconds * self.sample_rate as f64) as usize
    }

    /// Maximum number of lookahead samples available to the packer.
    /// The budget floor of one second matches the default overlap.
    pub fn lookahead_max_samples(&self) -> usize {
        (self.lookahead_seconds.max(1.0) * self.sample_rate as f64) as usize
    }

    /// Number of samples in the tail-silence check window (floor 20 ms).
    pub fn tail_check_samples(&self) -> usize {
        let floor_ms = defaults::TAIL_CHECK_FLOOR_MS;
        let ms = self.tail_check_ms.max(floor_ms);
        ((ms as f64 / 1000.0) * self.sample_rate as f64).max(1.0) as usize
    }
}
