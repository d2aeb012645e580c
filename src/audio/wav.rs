//! WAV file capture source.
//!
//! Plays a 16-bit PCM WAV file through the capture seam, delivering
//! fixed-size blocks as if they came from a microphone. Useful for
//! offline runs and end-to-end tests against recorded audio.

use crate::audio::capture::CaptureSource;
use crate::defaults;
use crate::error::{Result, TransvoxError};
use std::path::Path;

/// Capture source backed by a WAV file.
///
/// Multi-channel files are downmixed by keeping the first channel.
pub struct WavCaptureSource {
    samples: Vec<i16>,
    position: usize,
    block_len: usize,
    sample_rate: u32,
}

impl WavCaptureSource {
    /// Opens a WAV file and prepares it for block-wise reading.
    ///
    /// Only 16-bit integer PCM is accepted.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path).map_err(|e| TransvoxError::AudioCapture {
            message: format!("failed to open {}: {}", path.display(), e),
        })?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(TransvoxError::AudioFormatMismatch {
                expected: "16-bit integer PCM".to_string(),
                actual: format!("{}-bit {:?}", spec.bits_per_sample, spec.sample_format),
            });
        }

        let channels = spec.channels as usize;
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .step_by(channels)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| TransvoxError::AudioCapture {
                message: format!("failed to decode {}: {}", path.display(), e),
            })?;

        let block_len = ((defaults::BLOCK_MS as f64 / 1000.0) * spec.sample_rate as f64)
            .max(1.0) as usize;

        Ok(Self {
            samples,
            position: 0,
            block_len,
            sample_rate: spec.sample_rate,
        })
    }

    /// Total duration of the file in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

impl CaptureSource for WavCaptureSource {
    fn start(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_block(&mut self) -> Result<Option<Vec<i16>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.position + self.block_len).min(self.samples.len());
        let block = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(block))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
