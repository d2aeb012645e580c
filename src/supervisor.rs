//! Pipeline supervisor.
//!
//! Wires the capture feed, segment packer, transcription worker and
//! translation dispatcher together, and owns the lifecycle state
//! machine: Idle → Starting → Running → Stopping → Stopped.

use crate::audio::capture::{CaptureFeed, CaptureSource};
use crate::audio::level::LevelMeter;
use crate::audio::ring::RingAudioBuffer;
use crate::audio::vad::VoiceActivityGate;
use crate::config::PipelineConfig;
use crate::defaults;
use crate::error::{Result, TransvoxError};
use crate::packer::SegmentPacker;
use crate::queue::{WorkSender, work_queue};
use crate::sink::DisplaySink;
use crate::stt::SpeechEngine;
use crate::translate::{TranslationDispatcher, Translator};
use crate::worker::TranscriptionWorker;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Lifecycle state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, never started.
    Idle,
    /// Start in progress.
    Starting,
    /// All components running.
    Running,
    /// Stop in progress.
    Stopping,
    /// Fully stopped; a stopped pipeline is not restarted.
    Stopped,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Idle => "Idle",
            PipelineState::Starting => "Starting",
            PipelineState::Running => "Running",
            PipelineState::Stopping => "Stopping",
            PipelineState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Builder for [`PipelineSupervisor`].
///
/// Capture source, speech engine and display sink are required; the
/// translator is optional and only used when the configuration enables
/// translation.
pub struct PipelineBuilder {
    config: PipelineConfig,
    source: Option<Box<dyn CaptureSource>>,
    engine: Option<Box<dyn SpeechEngine>>,
    sink: Option<Arc<dyn DisplaySink>>,
    translator: Option<Arc<dyn Translator>>,
    gate: Option<VoiceActivityGate>,
}

impl PipelineBuilder {
    /// Starts a builder from a configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            source: None,
            engine: None,
            sink: None,
            translator: None,
            gate: None,
        }
    }

    /// Sets the audio capture source.
    pub fn source(mut self, source: Box<dyn CaptureSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the speech engine.
    pub fn engine(mut self, engine: Box<dyn SpeechEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the display sink.
    pub fn sink(mut self, sink: Arc<dyn DisplaySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the translation service.
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Sets a custom voice-activity gate. Without one, an RMS-only gate
    /// at the configured aggressiveness is used when VAD is enabled.
    pub fn gate(mut self, gate: VoiceActivityGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Validates the configuration and builds the supervisor.
    pub fn build(self) -> Result<PipelineSupervisor> {
        self.config.validate()?;

        let source = self.source.ok_or_else(|| TransvoxError::Other(
            "pipeline requires a capture source".to_string(),
        ))?;
        let engine = self.engine.ok_or_else(|| TransvoxError::Other(
            "pipeline requires a speech engine".to_string(),
        ))?;
        let sink = self.sink.ok_or_else(|| TransvoxError::Other(
            "pipeline requires a display sink".to_string(),
        ))?;

        if self.config.translation_enabled && self.translator.is_none() {
            return Err(TransvoxError::ConfigInvalidValue {
                key: "translation_enabled".to_string(),
                message: "no translator provided".to_string(),
            });
        }

        Ok(PipelineSupervisor {
            config: self.config,
            state: PipelineState::Idle,
            pending: Some(PendingComponents {
                source,
                engine,
                sink,
                translator: self.translator,
                gate: self.gate,
            }),
            running: None,
        })
    }
}

struct PendingComponents {
    source: Box<dyn CaptureSource>,
    engine: Box<dyn SpeechEngine>,
    sink: Arc<dyn DisplaySink>,
    translator: Option<Arc<dyn Translator>>,
    gate: Option<VoiceActivityGate>,
}

struct RunningComponents {
    feed: CaptureFeed,
    packer: SegmentPacker,
    worker: TranscriptionWorker,
    queue_tx: WorkSender,
    dispatcher: Option<Arc<TranslationDispatcher>>,
    buffer: Arc<RingAudioBuffer>,
    meter: Arc<LevelMeter>,
}

/// Owns and supervises all pipeline components.
pub struct PipelineSupervisor {
    config: PipelineConfig,
    state: PipelineState,
    pending: Option<PendingComponents>,
    running: Option<RunningComponents>,
}

impl PipelineSupervisor {
    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Current input level in `[0.0, 1.0]`; 0.0 when not running.
    pub fn level(&self) -> f32 {
        self.running.as_ref().map(|r| r.meter.level()).unwrap_or(0.0)
    }

    /// Seconds of audio currently buffered; 0.0 when not running.
    pub fn buffered_seconds(&self) -> f64 {
        self.running
            .as_ref()
            .map(|r| r.buffer.duration_seconds())
            .unwrap_or(0.0)
    }

    /// Segments dropped so far because the work queue was full.
    pub fn dropped_segments(&self) -> u64 {
        self.running
            .as_ref()
            .map(|r| r.queue_tx.dropped_count())
            .unwrap_or(0)
    }

    /// Starts the pipeline.
    ///
    /// Only valid from `Idle`. If the capture source fails to start,
    /// nothing else is spawned and the pipeline moves to `Stopped`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(TransvoxError::PipelineState {
                state: self.state.to_string(),
                operation: "start".to_string(),
            });
        }
        self.state = PipelineState::Starting;

        let components = self.pending.take().ok_or_else(|| TransvoxError::Other(
            "pipeline components already consumed".to_string(),
        ))?;

        let buffer = Arc::new(RingAudioBuffer::new(
            self.config.buffer_seconds,
            self.config.sample_rate,
        ));
        let meter = Arc::new(LevelMeter::new());
        let (queue_tx, queue_rx) = work_queue(self.config.queue_capacity);

        let feed = match CaptureFeed::start(components.source, buffer.clone(), meter.clone()) {
            Ok(feed) => feed,
            Err(e) => {
                self.state = PipelineState::Stopped;
                return Err(e);
            }
        };

        let dispatcher = match components.translator {
            Some(translator) if self.config.translation_enabled => {
                match TranslationDispatcher::new(
                    translator,
                    self.config.target_language.clone(),
                ) {
                    Ok(dispatcher) => Some(Arc::new(dispatcher)),
                    Err(e) => {
                        self.state = PipelineState::Stopped;
                        return Err(e);
                    }
                }
            }
            _ => None,
        };

        let worker_sink = components.sink;
        let worker_dispatcher = dispatcher.clone();
        let worker_meter = meter.clone();
        let worker = TranscriptionWorker::start(
            components.engine,
            queue_rx,
            Box::new(move |result| {
                if let Err(e) = worker_sink.show_transcription(&result, worker_meter.level()) {
                    eprintln!("transvox: sink error: {}", e);
                }
                if let Some(ref dispatcher) = worker_dispatcher {
                    let translation_sink = worker_sink.clone();
                    dispatcher.dispatch(
                        result.text.clone(),
                        result.language.clone(),
                        Box::new(move |translation| {
                            if let Err(e) = translation_sink.apply_translation(&translation) {
                                eprintln!("transvox: sink error: {}", e);
                            }
                        }),
                    );
                }
            }),
        );

        let gate = components.gate.or_else(|| {
            if self.config.vad_enabled {
                Some(VoiceActivityGate::new(self.config.vad_aggressiveness))
            } else {
                None
            }
        });
        let packer = SegmentPacker::start(
            self.config.clone(),
            buffer.clone(),
            queue_tx.clone(),
            gate,
        );

        self.running = Some(RunningComponents {
            feed,
            packer,
            worker,
            queue_tx,
            dispatcher,
            buffer,
            meter,
        });
        self.state = PipelineState::Running;
        Ok(())
    }

    /// Stops the pipeline.
    ///
    /// Idempotent: stopping an already stopped (or never started)
    /// pipeline is a no-op. Components are stopped upstream-first so no
    /// new work arrives while downstream drains; the worker gets a
    /// bounded grace period and is detached if it exceeds it.
    pub fn stop(&mut self) {
        match self.state {
            PipelineState::Running | PipelineState::Starting => {}
            _ => {
                self.state = PipelineState::Stopped;
                return;
            }
        }
        self.state = PipelineState::Stopping;

        if let Some(mut running) = self.running.take() {
            running.packer.stop();
            running.feed.stop();

            // Let the worker drain the queue, then observe the sentinel.
            running.queue_tx.push_stop();
            let deadline = Instant::now() + Duration::from_millis(defaults::SHUTDOWN_GRACE_MS);
            while running.worker.is_running() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(20));
            }
            if running.worker.is_running() {
                eprintln!("transvox: worker did not stop in time, detaching");
                running.worker.detach();
            } else {
                running.worker.stop();
            }

            if let Some(dispatcher) = running.dispatcher {
                dispatcher.shutdown();
            }
            running.meter.reset();
        }

        self.state = PipelineState::Stopped;
    }
}

impl Drop for PipelineSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::ScriptedCaptureSource;
    use crate::sink::CollectorSink;
    use crate::stt::MockSpeechEngine;
    use crate::translate::MockTranslator;

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            chunk_seconds: 0.6,
            buffer_seconds: 2.0,
            ..Default::default()
        }
    }

    fn speech_source() -> ScriptedCaptureSource {
        // 0.5s of loud audio followed by silence, in 100ms blocks.
        let mut blocks: Vec<Vec<i16>> = (0..5).map(|_| vec![5000i16; 1600]).collect();
        blocks.extend((0..5).map(|_| vec![0i16; 1600]));
        ScriptedCaptureSource::new(16000).with_blocks(blocks)
    }

    fn build_supervisor(
        config: PipelineConfig,
        source: ScriptedCaptureSource,
        sink: Arc<CollectorSink>,
    ) -> PipelineSupervisor {
        PipelineBuilder::new(config)
            .source(Box::new(source))
            .engine(Box::new(MockSpeechEngine::new().with_texts(&["hello there"])))
            .sink(sink)
            .build()
            .unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let sink = Arc::new(CollectorSink::new());
        let supervisor = build_supervisor(fast_config(), speech_source(), sink);
        assert_eq!(supervisor.state(), PipelineState::Idle);
        assert_eq!(supervisor.level(), 0.0);
    }

    #[test]
    fn test_start_from_running_is_rejected() {
        let sink = Arc::new(CollectorSink::new());
        let mut supervisor = build_supervisor(fast_config(), speech_source(), sink);
        supervisor.start().unwrap();
        assert_eq!(supervisor.state(), PipelineState::Running);

        assert!(matches!(
            supervisor.start(),
            Err(TransvoxError::PipelineState { .. })
        ));
        supervisor.stop();
    }

    #[test]
    fn test_capture_start_failure_moves_to_stopped() {
        let sink = Arc::new(CollectorSink::new());
        let source = ScriptedCaptureSource::new(16000).with_start_failure();
        let mut supervisor = build_supervisor(fast_config(), source, sink);

        assert!(supervisor.start().is_err());
        assert_eq!(supervisor.state(), PipelineState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let sink = Arc::new(CollectorSink::new());
        let mut supervisor = build_supervisor(fast_config(), speech_source(), sink);
        supervisor.start().unwrap();
        supervisor.stop();
        assert_eq!(supervisor.state(), PipelineState::Stopped);
        supervisor.stop();
        assert_eq!(supervisor.state(), PipelineState::Stopped);
    }

    #[test]
    fn test_stop_without_start() {
        let sink = Arc::new(CollectorSink::new());
        let mut supervisor = build_supervisor(fast_config(), speech_source(), sink);
        supervisor.stop();
        assert_eq!(supervisor.state(), PipelineState::Stopped);
        // A stopped pipeline is not restarted.
        assert!(supervisor.start().is_err());
    }

    #[test]
    fn test_end_to_end_transcription() {
        let sink = Arc::new(CollectorSink::new());
        let mut supervisor = build_supervisor(fast_config(), speech_source(), sink.clone());
        supervisor.start().unwrap();

        // One packer cadence plus worker latency.
        for _ in 0..100 {
            if !sink.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        supervisor.stop();

        let entries = sink.entries();
        assert!(!entries.is_empty(), "no transcription reached the sink");
        assert_eq!(entries[0].text, "hello there");
    }

    #[test]
    fn test_translation_requires_translator() {
        let config = PipelineConfig {
            translation_enabled: true,
            ..fast_config()
        };
        let result = PipelineBuilder::new(config)
            .source(Box::new(speech_source()))
            .engine(Box::new(MockSpeechEngine::new()))
            .sink(Arc::new(CollectorSink::new()))
            .build();
        assert!(matches!(
            result,
            Err(TransvoxError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_end_to_end_with_translation() {
        let config = PipelineConfig {
            translation_enabled: true,
            target_language: "pt".to_string(),
            ..fast_config()
        };
        let sink = Arc::new(CollectorSink::new());
        let mut supervisor = PipelineBuilder::new(config)
            .source(Box::new(speech_source()))
            .engine(Box::new(MockSpeechEngine::new().with_texts(&["hello there"])))
            .sink(sink.clone())
            .translator(Arc::new(MockTranslator::new()))
            .build()
            .unwrap();
        supervisor.start().unwrap();

        for _ in 0..100 {
            let entries = sink.entries();
            if entries.first().and_then(|e| e.translation.clone()).is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        supervisor.stop();

        let entries = sink.entries();
        assert!(!entries.is_empty());
        assert_eq!(
            entries[0].translation.as_deref(),
            Some("[pt] hello there")
        );
    }

    #[test]
    fn test_builder_requires_engine() {
        let result = PipelineBuilder::new(fast_config())
            .source(Box::new(speech_source()))
            .sink(Arc::new(CollectorSink::new()))
            .build();
        assert!(result.is_err());
    }
}
