//! Error types for transvox.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransvoxError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    // Transcription errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Translation errors
    #[error("Translation failed: {message}")]
    Translation { message: String },

    // Voice activity detection errors
    #[error("Voice activity classification failed: {message}")]
    VoiceActivity { message: String },

    // Pipeline lifecycle errors
    #[error("Pipeline is in state {state}, cannot {operation}")]
    PipelineState { state: String, operation: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, TransvoxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = TransvoxError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = TransvoxError::ConfigInvalidValue {
            key: "sample_rate".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for sample_rate: must be positive"
        );
    }

    #[test]
    fn test_audio_capture_display() {
        let error = TransvoxError::AudioCapture {
            message: "stream failed to open".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio capture failed: stream failed to open"
        );
    }

    #[test]
    fn test_transcription_display() {
        let error = TransvoxError::Transcription {
            message: "engine timed out".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription failed: engine timed out");
    }

    #[test]
    fn test_translation_display() {
        let error = TransvoxError::Translation {
            message: "service unavailable".to_string(),
        };
        assert_eq!(error.to_string(), "Translation failed: service unavailable");
    }

    #[test]
    fn test_pipeline_state_display() {
        let error = TransvoxError::PipelineState {
            state: "Running".to_string(),
            operation: "start".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Pipeline is in state Running, cannot start"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: TransvoxError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: TransvoxError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<TransvoxError>();
        assert_sync::<TransvoxError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
