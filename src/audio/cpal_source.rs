//! Microphone capture using CPAL (Cross-Platform Audio Library).
//!
//! Enabled by the `cpal-audio` feature so the core pipeline builds on
//! machines without audio backends installed.

use crate::audio::capture::CaptureSource;
use crate::defaults;
use crate::error::{Result, TransvoxError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched from one thread at a time through
/// the Mutex in MicCaptureSource; its methods are called synchronously.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Real microphone capture implementation using CPAL.
///
/// Captures 16-bit PCM mono at the configured rate. Tries an i16 stream
/// first, then falls back to f32 with conversion for devices that only
/// expose float formats.
pub struct MicCaptureSource {
    device: cpal::Device,
    stream: Mutex<Option<SendableStream>>,
    shared: Arc<Mutex<Vec<i16>>>,
    sample_rate: u32,
}

impl MicCaptureSource {
    /// Creates a capture source for the named input device, or the
    /// system default when `device_name` is `None`.
    pub fn new(device_name: Option<&str>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices =
                    host.input_devices().map_err(|e| TransvoxError::AudioCapture {
                        message: format!("failed to enumerate input devices: {}", e),
                    })?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| TransvoxError::AudioDeviceNotFound {
                        device: name.to_string(),
                    })?
            }
            None => host
                .default_input_device()
                .ok_or_else(|| TransvoxError::AudioDeviceNotFound {
                    device: "default".to_string(),
                })?,
        };

        Ok(Self {
            device,
            stream: Mutex::new(None),
            shared: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
        })
    }

    /// Lists input device names visible to the default host.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| TransvoxError::AudioCapture {
            message: format!("failed to enumerate input devices: {}", e),
        })?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let config = cpal::StreamConfig {
            channels: defaults::CHANNELS,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("transvox: audio stream error: {}", err);
        };

        // Preferred path: i16 delivered as-is.
        let shared = Arc::clone(&self.shared);
        if let Ok(stream) = self.device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = shared.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Fallback: f32 converted to i16.
        let shared = Arc::clone(&self.shared);
        self.device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = shared.lock() {
                        buf.extend(
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        );
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| TransvoxError::AudioCapture {
                message: format!("failed to build input stream: {}", e),
            })
    }
}

impl CaptureSource for MicCaptureSource {
    fn start(&mut self) -> Result<()> {
        let mut guard = self.stream.lock().map_err(|e| TransvoxError::AudioCapture {
            message: format!("failed to lock stream: {}", e),
        })?;
        if guard.is_some() {
            return Ok(());
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| TransvoxError::AudioCapture {
            message: format!("failed to start audio stream: {}", e),
        })?;
        *guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut guard = self.stream.lock().map_err(|e| TransvoxError::AudioCapture {
            message: format!("failed to lock stream: {}", e),
        })?;
        if let Some(stream) = guard.take() {
            stream.0.pause().map_err(|e| TransvoxError::AudioCapture {
                message: format!("failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn read_block(&mut self) -> Result<Option<Vec<i16>>> {
        let mut shared = self.shared.lock().map_err(|e| TransvoxError::AudioCapture {
            message: format!("failed to lock audio buffer: {}", e),
        })?;
        Ok(Some(std::mem::take(&mut *shared)))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
