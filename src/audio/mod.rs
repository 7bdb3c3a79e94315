//! Audio I/O abstraction: the core treats this as an opaque sample/tone
//! transport. Real backends (file, system default) live here; the FSK
//! core only ever sees the `AudioSource`/`AudioSink` traits.

pub mod memory;

#[cfg(feature = "audio")]
pub mod wav;

#[cfg(feature = "audio-live")]
pub mod live;

use crate::error::ModemError;

/// A blocking sample source: the receive loop's transport.
pub trait AudioSource {
    fn sample_rate(&self) -> u32;

    /// Blocking read of up to `dst.len()` samples. Returns the number of
    /// samples actually written to the front of `dst`; `0` means end of
    /// stream.
    fn read(&mut self, dst: &mut [f32]) -> Result<usize, ModemError>;
}

/// A blocking sample sink: the transmit loop's transport.
pub trait AudioSink {
    fn sample_rate(&self) -> u32;

    /// Blocking write of raw samples (already-synthesized tone audio).
    fn write_samples(&mut self, samples: &[f32]) -> Result<(), ModemError>;

    /// Called once transmission has finished, to flush/close the stream.
    fn finish(&mut self) -> Result<(), ModemError> {
        Ok(())
    }
}

pub use memory::{MemorySink, MemorySource};

#[cfg(feature = "audio")]
pub use wav::{WavFileSink, WavFileSource};

#[cfg(feature = "audio-live")]
pub use live::{LiveInputStream, LiveOutputStream};
