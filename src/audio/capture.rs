//! Audio capture feed.
//!
//! [`CaptureSource`] is the seam for pluggable audio input (microphone,
//! WAV playback, scripted test source). [`CaptureFeed`] runs a source
//! on a dedicated thread, appending each block to the shared ring
//! buffer and updating the level meter.

use crate::audio::level::LevelMeter;
use crate::audio::ring::RingAudioBuffer;
use crate::error::{Result, TransvoxError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Trait for audio capture devices.
///
/// This trait allows swapping implementations (real audio device vs
/// WAV file vs scripted test source).
pub trait CaptureSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read the next block of 16-bit mono PCM samples.
    ///
    /// An empty block means no audio is available yet; `None` means the
    /// source is exhausted (only finite sources like WAV files end).
    fn read_block(&mut self) -> Result<Option<Vec<i16>>>;

    /// Sample rate the source delivers, in Hz.
    fn sample_rate(&self) -> u32;
}

/// Drives a [`CaptureSource`] on a background thread.
pub struct CaptureFeed {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureFeed {
    /// Starts the source and spawns the capture thread.
    ///
    /// The thread appends every non-empty block to `buffer` and updates
    /// `meter`, until [`stop`](CaptureFeed::stop) is called, the source
    /// is exhausted, or a read error occurs. Read errors are logged and
    /// end the feed; the ring buffer keeps whatever was captured.
    pub fn start(
        mut source: Box<dyn CaptureSource>,
        buffer: Arc<RingAudioBuffer>,
        meter: Arc<LevelMeter>,
    ) -> Result<Self> {
        source.start()?;

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let thread = thread::spawn(move || {
            while thread_running.load(Ordering::SeqCst) {
                match source.read_block() {
                    Ok(Some(block)) if !block.is_empty() => {
                        meter.update(&block);
                        buffer.append(&block);
                    }
                    Ok(Some(_)) => {
                        // No audio yet, wait briefly.
                        thread::sleep(Duration::from_millis(5));
                    }
                    Ok(None) => {
                        eprintln!("transvox: capture source exhausted");
                        break;
                    }
                    Err(e) => {
                        eprintln!("transvox: capture error: {}", e);
                        break;
                    }
                }
            }
            if let Err(e) = source.stop() {
                eprintln!("transvox: capture stop error: {}", e);
            }
            thread_running.store(false, Ordering::SeqCst);
        });

        Ok(Self {
            running,
            thread: Some(thread),
        })
    }

    /// Returns true while the capture thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals the capture thread to stop and waits for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                eprintln!("transvox: capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scripted capture source for testing.
///
/// Delivers a fixed sequence of blocks, then reports exhaustion.
pub struct ScriptedCaptureSource {
    blocks: Vec<Vec<i16>>,
    index: usize,
    sample_rate: u32,
    is_started: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl ScriptedCaptureSource {
    /// Create a new scripted source with no blocks.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            blocks: Vec::new(),
            index: 0,
            sample_rate,
            is_started: false,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "scripted capture error".to_string(),
        }
    }

    /// Configure the blocks the source will deliver, in order.
    pub fn with_blocks(mut self, blocks: Vec<Vec<i16>>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Configure the source to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the source to fail on the first read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Check if the source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl CaptureSource for ScriptedCaptureSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(TransvoxError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_block(&mut self) -> Result<Option<Vec<i16>>> {
        if self.should_fail_read {
            return Err(TransvoxError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        match self.blocks.get(self.index) {
            Some(block) => {
                self.index += 1;
                Ok(Some(block.clone()))
            }
            None => Ok(None),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
