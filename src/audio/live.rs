//! System-default audio backend: playback/record via `cpal`.
//!
//! The transmit loop accumulates the whole session's samples and plays
//! them in one continuous stream on `finish()`; the receive loop captures
//! continuously into a growing buffer and `read()` polls it, matching the
//! blocking read/write contract the FSK core expects from `AudioSource`/
//! `AudioSink`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{AudioSink, AudioSource};
use crate::error::ModemError;

/// Polling interval while waiting on the cpal callback thread.
const POLL_INTERVAL_MS: u64 = 10;

/// Delay after playback finishes to let the audio device flush its buffer.
const DRAIN_DELAY_MS: u64 = 50;

fn stream_config(sample_rate: u32) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Buffers samples written by the transmit loop, then plays them through
/// the default output device once `finish()` is called.
pub struct LiveOutputStream {
    sample_rate: u32,
    pending: Vec<f32>,
}

impl LiveOutputStream {
    pub fn open(sample_rate: u32) -> Result<Self, ModemError> {
        cpal::default_host()
            .default_output_device()
            .ok_or_else(|| ModemError::Resource("no output audio device available".into()))?;
        Ok(Self { sample_rate, pending: Vec::new() })
    }
}

impl AudioSink for LiveOutputStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write_samples(&mut self, samples: &[f32]) -> Result<(), ModemError> {
        self.pending.extend_from_slice(samples);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ModemError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ModemError::Resource("no output audio device available".into()))?;
        let config = stream_config(self.sample_rate);

        let data = Arc::new(std::mem::take(&mut self.pending));
        let cursor = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let error_flag: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let data_cb = Arc::clone(&data);
        let cursor_cb = Arc::clone(&cursor);
        let finished_cb = Arc::clone(&finished);
        let error_cb = Arc::clone(&error_flag);

        let stream = device
            .build_output_stream(
                &config,
                move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let len = data_cb.len();
                    for sample in output.iter_mut() {
                        let pos = cursor_cb.fetch_add(1, Ordering::Relaxed);
                        if pos < len {
                            *sample = data_cb[pos];
                        } else {
                            *sample = 0.0;
                            finished_cb.store(true, Ordering::Release);
                        }
                    }
                },
                move |err| {
                    *lock_or_recover(&error_cb) = Some(format!("output stream error: {}", err));
                },
                None,
            )
            .map_err(|e| ModemError::Audio(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ModemError::Audio(format!("failed to play stream: {}", e)))?;

        while !finished.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
            if let Some(err) = lock_or_recover(&error_flag).take() {
                return Err(ModemError::Audio(err));
            }
        }

        std::thread::sleep(Duration::from_millis(DRAIN_DELAY_MS));
        drop(stream);
        Ok(())
    }
}

/// Captures from the default input device continuously into a growing
/// buffer; `read()` polls that buffer.
pub struct LiveInputStream {
    sample_rate: u32,
    buffer: Arc<Mutex<Vec<f32>>>,
    error_flag: Arc<Mutex<Option<String>>>,
    pos: usize,
    _stream: cpal::Stream,
}

impl LiveInputStream {
    pub fn open(sample_rate: u32) -> Result<Self, ModemError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ModemError::Resource("no input audio device available".into()))?;
        let config = stream_config(sample_rate);

        let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let error_flag: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let buffer_cb = Arc::clone(&buffer);
        let error_cb = Arc::clone(&error_flag);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    lock_or_recover(&buffer_cb).extend_from_slice(data);
                },
                move |err| {
                    *lock_or_recover(&error_cb) = Some(format!("input stream error: {}", err));
                },
                None,
            )
            .map_err(|e| ModemError::Audio(format!("failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ModemError::Audio(format!("failed to start recording: {}", e)))?;

        Ok(Self { sample_rate, buffer, error_flag, pos: 0, _stream: stream })
    }
}

impl AudioSource for LiveInputStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, dst: &mut [f32]) -> Result<usize, ModemError> {
        loop {
            if let Some(err) = lock_or_recover(&self.error_flag).take() {
                return Err(ModemError::Audio(err));
            }
            let available = {
                let buf = lock_or_recover(&self.buffer);
                buf.len().saturating_sub(self.pos)
            };
            if available > 0 {
                let n = available.min(dst.len());
                let buf = lock_or_recover(&self.buffer);
                dst[..n].copy_from_slice(&buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        }
    }
}
