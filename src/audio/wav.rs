//! File audio backend (`-f|--file`): WAV read/write via `hound`.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::{AudioSink, AudioSource};
use crate::error::ModemError;

/// An `AudioSource` backed by a WAV file, read once at construction time
/// (the receive loop only ever needs blocking, forward-only reads).
pub struct WavFileSource {
    sample_rate: u32,
    samples: Vec<f32>,
    pos: usize,
}

impl WavFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ModemError> {
        let reader = WavReader::open(path)
            .map_err(|e| ModemError::Resource(format!("WAV read error: {}", e)))?;
        let spec = reader.spec();
        let sample_rate = spec.sample_rate;

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map_err(|e| ModemError::Audio(format!("WAV sample error: {}", e))))
                .collect::<Result<Vec<f32>, _>>()?,
            SampleFormat::Int => {
                let max_val = (1u32 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| {
                        s.map(|v| v as f32 / max_val)
                            .map_err(|e| ModemError::Audio(format!("WAV sample error: {}", e)))
                    })
                    .collect::<Result<Vec<f32>, _>>()?
            }
        };

        Ok(Self { sample_rate, samples, pos: 0 })
    }
}

impl AudioSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, dst: &mut [f32]) -> Result<usize, ModemError> {
        let remaining = self.samples.len() - self.pos;
        let n = remaining.min(dst.len());
        dst[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// An `AudioSink` backed by a WAV file, written incrementally and
/// finalized on `finish()`.
pub struct WavFileSink {
    sample_rate: u32,
    writer: Option<WavWriter<std::io::BufWriter<std::fs::File>>>,
}

impl WavFileSink {
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self, ModemError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec)
            .map_err(|e| ModemError::Resource(format!("WAV write error: {}", e)))?;
        Ok(Self { sample_rate, writer: Some(writer) })
    }
}

impl AudioSink for WavFileSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write_samples(&mut self, samples: &[f32]) -> Result<(), ModemError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ModemError::Audio("WAV sink already finalized".into()))?;
        for &s in samples {
            writer
                .write_sample(s)
                .map_err(|e| ModemError::Audio(format!("WAV sample write error: {}", e)))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ModemError> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| ModemError::Audio(format!("WAV finalize error: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_roundtrip() {
        let path = std::env::temp_dir().join("minimodem_test_wav_roundtrip.wav");
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.01).sin()).collect();
        let sr = 48000;

        let mut sink = WavFileSink::create(&path, sr).unwrap();
        sink.write_samples(&samples).unwrap();
        sink.finish().unwrap();

        let mut source = WavFileSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), sr);
        let mut read_back = vec![0.0f32; samples.len()];
        let n = source.read(&mut read_back).unwrap();
        assert_eq!(n, samples.len());
        for (a, b) in samples.iter().zip(read_back.iter()) {
            assert!((a - b).abs() < 1e-6);
        }

        std::fs::remove_file(&path).ok();
    }
}
