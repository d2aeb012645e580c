//! transvox - Real-time transcription and translation pipeline
//!
//! Segments live audio on silence boundaries, transcribes segments
//! through an injected speech engine, and translates results
//! asynchronously. Recognition and translation backends are supplied by
//! the embedding application.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod config;
pub mod defaults;
pub mod error;
pub mod packer;
pub mod queue;
pub mod sink;
pub mod stt;
pub mod supervisor;
pub mod translate;
pub mod types;
pub mod worker;

// Core traits (source → process → sink)
pub use audio::capture::CaptureSource;
pub use audio::vad::FrameClassifier;
pub use sink::{BackupSink, CollectorSink, ConsoleSink, DisplaySink, MultiSink};
pub use stt::{SpeechEngine, Transcription};
pub use translate::{Translator, TranslatorStack};

// Pipeline
pub use supervisor::{PipelineBuilder, PipelineState, PipelineSupervisor};

// Error handling
pub use error::{Result, TransvoxError};

// Config
pub use config::PipelineConfig;

// Data types
pub use types::{AudioSegment, TranscriptionResult, TranslationResult};
