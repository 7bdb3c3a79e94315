//! In-process audio backend: no real device or file, just `Vec<f32>`
//! buffers. Used by `--benchmarks` (no audio device needed) and by the
//! crate's end-to-end tests.

use super::{AudioSink, AudioSource};
use crate::error::ModemError;

/// A fixed in-memory sample buffer read from front to back.
pub struct MemorySource {
    sample_rate: u32,
    samples: Vec<f32>,
    pos: usize,
}

impl MemorySource {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { sample_rate, samples, pos: 0 }
    }
}

impl AudioSource for MemorySource {
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

/// Accumulates written samples into a growable buffer.
#[derive(Default)]
pub struct MemorySink {
    sample_rate: u32,
    pub samples: Vec<f32>,
}

impl MemorySink {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate, samples: Vec::new() }
    }
}

impl AudioSink for MemorySink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write_samples(&mut self, samples: &[f32]) -> Result<(), ModemError> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_reads_until_exhausted() {
        let mut src = MemorySource::new(vec![1.0, 2.0, 3.0], 48000);
        let mut buf = [0.0f32; 2];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1.0, 2.0]);
        assert_eq!(src.read(&mut buf).unwrap(), 1);
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn sink_accumulates_writes() {
        let mut sink = MemorySink::new(48000);
        sink.write_samples(&[1.0, 2.0]).unwrap();
        sink.write_samples(&[3.0]).unwrap();
        assert_eq!(sink.samples, vec![1.0, 2.0, 3.0]);
    }
}
