//! Default configuration constants for transvox.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default channel count. The pipeline is mono; multi-channel capture
/// sources keep only the first channel.
pub const CHANNELS: u16 = 1;

/// Default segment duration in seconds.
///
/// Larger chunks improve transcription accuracy at the cost of latency.
pub const CHUNK_SECONDS: f64 = 3.0;

/// Default ring buffer depth in seconds of retained audio.
pub const BUFFER_SECONDS: f64 = 15.0;

/// Default lookahead budget in seconds.
///
/// Extra audio beyond the fixed chunk duration used to avoid truncating
/// trailing speech. The effective budget is never below 1 second.
pub const LOOKAHEAD_SECONDS: f64 = 1.0;

/// Default trailing window checked for silence, in milliseconds.
pub const TAIL_CHECK_MS: u32 = 120;

/// Floor for the tail-check window, in milliseconds.
pub const TAIL_CHECK_FLOOR_MS: u32 = 20;

/// Step by which the packer grows a segment while hunting for a silent
/// tail, in seconds.
pub const TAIL_EXTEND_STEP_SECONDS: f64 = 0.2;

/// Default RMS threshold (raw 16-bit scale) below which the tail of a
/// segment counts as silence.
pub const SILENCE_THRESHOLD: f64 = 50.0;

/// Minimum RMS (raw 16-bit scale) for a packed segment to be worth
/// transcribing. Coarse pre-filter, independent of the voice-activity
/// gate's own thresholds.
pub const SPEECH_RMS_THRESHOLD: f64 = 25.0;

/// Minimum segment length in seconds; shorter candidates are discarded.
pub const MIN_SEGMENT_SECONDS: f64 = 0.5;

/// Peak amplitude target after normalization, as a fraction of i16 full
/// scale. Leaves headroom so normalization never clips.
pub const NORMALIZE_PEAK: f64 = 0.85;

/// Gain applied to block RMS when computing the displayed audio level.
/// Tuned for human speech dynamics; the result is clamped to 1.0.
pub const LEVEL_GAIN: f32 = 15.0;

/// Default capture block duration in milliseconds.
pub const BLOCK_MS: u32 = 100;

/// Default voice-activity frame size in milliseconds.
/// Frame classifiers accept exactly 10, 20 or 30 ms frames.
pub const VAD_FRAME_MS: u32 = 30;

/// Default voice-activity aggressiveness (0 = conservative, 3 = eager).
pub const VAD_AGGRESSIVENESS: u8 = 2;

/// Speech-frame ratio required for a segment to count as speech, keyed
/// by aggressiveness level 0..=3.
pub const VAD_RATIO_THRESHOLDS: [f32; 4] = [0.60, 0.40, 0.25, 0.15];

/// RMS fallback thresholds (raw 16-bit scale) keyed by aggressiveness
/// level 0..=3. Used when no frame classifier is available, or when one
/// errors on a single frame.
pub const VAD_RMS_THRESHOLDS: [f64; 4] = [35.0, 25.0, 18.0, 12.0];

/// Default work queue capacity, in segments.
///
/// When the queue is full, new segments are dropped rather than blocking
/// the capture path.
pub const QUEUE_CAPACITY: usize = 4;

/// Worker poll timeout in milliseconds. Also bounds how long a stop
/// request can take to be observed.
pub const WORKER_POLL_MS: u64 = 500;

/// Grace period for pipeline shutdown, in milliseconds. After this the
/// supervisor detaches remaining threads instead of waiting forever.
pub const SHUTDOWN_GRACE_MS: u64 = 3000;

/// Capacity of the recent-transcript window used to suppress immediate
/// repeats caused by segment overlap.
pub const RECENT_TEXT_WINDOW: usize = 5;
