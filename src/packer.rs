//! Segment packer.
//!
//! Wakes on a fixed cadence, snapshots the most recent audio from the
//! ring buffer, and decides what to hand to the transcription worker.
//! The interesting part is the tail-silence lookahead: a segment whose
//! tail still contains speech is extended in small steps, waiting for
//! fresh audio, until either the tail goes quiet or the lookahead
//! budget runs out. Cutting mid-word costs transcription accuracy on
//! both sides of the cut.

use crate::audio::ring::RingAudioBuffer;
use crate::audio::vad::{self, VoiceActivityGate};
use crate::config::PipelineConfig;
use crate::defaults;
use crate::queue::WorkSender;
use crate::types::AudioSegment;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Returns true when the trailing `tail_samples` of `samples` are below
/// the silence threshold. A segment shorter than the tail window is
/// judged on all of it.
pub fn tail_is_silent(samples: &[i16], tail_samples: usize, threshold: f64) -> bool {
    if samples.is_empty() {
        return true;
    }
    let start = samples.len().saturating_sub(tail_samples.max(1));
    vad::rms_raw(&samples[start..]) < threshold
}

/// Scales samples so the peak sits at [`defaults::NORMALIZE_PEAK`] of
/// full scale. Pure silence is returned unchanged.
pub fn normalize_peak(samples: &[i16]) -> Vec<i16> {
    let peak = samples.iter().map(|&s| (s as i32).abs()).max().unwrap_or(0);
    if peak == 0 {
        return samples.to_vec();
    }
    let target = i16::MAX as f64 * defaults::NORMALIZE_PEAK;
    let scale = target / peak as f64;
    samples
        .iter()
        .map(|&s| {
            (s as f64 * scale)
                .round()
                .clamp(i16::MIN as f64, i16::MAX as f64) as i16
        })
        .collect()
}

/// Applies the acceptance gates to a candidate segment and produces the
/// normalized [`AudioSegment`] to queue, or `None` if the candidate is
/// rejected.
///
/// Gates, in order:
/// 1. minimum duration (too short to carry a word)
/// 2. coarse whole-segment RMS (near-silence is not worth an engine call)
/// 3. voice-activity gate, when configured
pub fn finalize_segment(
    samples: &[i16],
    config: &PipelineConfig,
    gate: Option<&mut VoiceActivityGate>,
) -> Option<AudioSegment> {
    let duration = samples.len() as f64 / config.sample_rate as f64;
    if duration < defaults::MIN_SEGMENT_SECONDS {
        return None;
    }

    if vad::rms_raw(samples) < config.speech_rms_threshold {
        return None;
    }

    if let Some(gate) = gate {
        if !gate.is_speech(samples, config.sample_rate) {
            return None;
        }
    }

    Some(AudioSegment::new(
        normalize_peak(samples),
        config.sample_rate,
        config.language_hint.clone(),
    ))
}

/// Background thread that packs ring-buffer audio into queued segments.
pub struct SegmentPacker {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SegmentPacker {
    /// Spawns the packer thread.
    ///
    /// `gate` is consulted only when `config.vad_enabled` is set.
    pub fn start(
        config: PipelineConfig,
        buffer: Arc<RingAudioBuffer>,
        queue: WorkSender,
        mut gate: Option<VoiceActivityGate>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let thread = thread::spawn(move || {
            let required = config.required_samples();
            let budget = config.lookahead_max_samples();
            let tail_samples = config.tail_check_samples();
            let step =
                (defaults::TAIL_EXTEND_STEP_SECONDS * config.sample_rate as f64).max(1.0) as usize;
            let step_sleep = Duration::from_secs_f64(defaults::TAIL_EXTEND_STEP_SECONDS);
            let cadence = Duration::from_secs_f64(config.chunk_seconds);

            while thread_running.load(Ordering::SeqCst) {
                if !sleep_while_running(&thread_running, cadence) {
                    break;
                }

                if buffer.is_empty() {
                    eprintln!("transvox: waiting for audio");
                    continue;
                }
                if buffer.len() < required {
                    // Not enough audio for a full chunk yet.
                    continue;
                }

                let mut take = required;
                let mut extended = 0usize;
                let mut samples = buffer.snapshot_last(take);

                // Extend while the tail is still speech and budget remains,
                // waiting for fresh audio between steps.
                while thread_running.load(Ordering::SeqCst)
                    && !tail_is_silent(&samples, tail_samples, config.silence_threshold)
                    && extended + step <= budget
                {
                    if !sleep_while_running(&thread_running, step_sleep) {
                        break;
                    }
                    extended += step;
                    take = required + extended;
                    samples = buffer.snapshot_last(take);
                }

                let effective_gate = if config.vad_enabled {
                    gate.as_mut()
                } else {
                    None
                };
                if let Some(segment) = finalize_segment(&samples, &config, effective_gate) {
                    queue.try_push(segment);
                }
            }
        });

        Self {
            running,
            thread: Some(thread),
        }
    }

    /// Returns true while the packer thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals the packer to stop and waits for the thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                eprintln!("transvox: packer thread panicked");
            }
        }
    }
}

impl Drop for SegmentPacker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sleeps in short slices so a stop request is observed promptly.
/// Returns false if the running flag cleared during the sleep.
fn sleep_while_running(running: &AtomicBool, total: Duration) -> bool {
    let slice = Duration::from_millis(20);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let nap = remaining.min(slice);
        thread::sleep(nap);
        remaining -= nap;
    }
    running.load(Ordering::SeqCst)
}
