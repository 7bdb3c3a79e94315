//! Transmit loop: frames input bytes and synthesizes FSK tone audio.
//!
//! Input is read from a background thread and handed across an `mpsc`
//! channel so the main loop can apply an idle timeout with
//! `recv_timeout` instead of the original tool's `SIGALRM`-based timer.

use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;

use crate::audio::AudioSink;
use crate::config::Config;
use crate::error::ModemError;
use crate::framebits::FrameCodec;
use crate::tone::ToneGenerator;

/// How long `run_with_idle_timeout` waits for the next input byte before
/// giving up and ending the transmission early.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TransmitLoop {
    sample_rate: u32,
    mark_freq: f32,
    space_freq: f32,
    samples_per_bit: f32,
    tx_stop_bits: f32,
    tx_leader_bits: u32,
    tx_trailer_bits: u32,
    codec: FrameCodec,
    tone: ToneGenerator,
}

impl TransmitLoop {
    pub fn new(config: &Config) -> Self {
        let samples_per_bit = config.sample_rate as f32 / config.data_rate;
        Self {
            sample_rate: config.sample_rate,
            mark_freq: config.mark_freq,
            space_freq: config.space_freq,
            samples_per_bit,
            tx_stop_bits: config.tx_stop_bits,
            tx_leader_bits: config.tx_leader_bits,
            tx_trailer_bits: config.tx_trailer_bits,
            codec: FrameCodec::new(config.n_data_bits),
            tone: ToneGenerator::new(config.sample_rate, config.tx_sin_table_len),
        }
    }

    /// Encodes every byte of `data` (already fully read) into one
    /// continuous stream of samples: leader, one frame per byte, trailer.
    pub fn run<W: AudioSink>(&mut self, data: &[u8], sink: &mut W) -> Result<(), ModemError> {
        let mut samples = Vec::new();
        self.write_leader(&mut samples);
        for &byte in data {
            for word in self.codec.encode(byte) {
                self.write_frame(&mut samples, word);
            }
        }
        self.write_trailer(&mut samples);
        sink.write_samples(&samples)?;
        sink.finish()
    }

    /// Like `run`, but reads from `input` on a background thread and stops
    /// early if no byte arrives within `idle_timeout` (default 5s),
    /// matching the original tool's idle-disconnect behavior without
    /// relying on signals.
    pub fn run_with_idle_timeout<R, W>(
        &mut self,
        mut input: R,
        sink: &mut W,
        idle_timeout: Option<Duration>,
    ) -> Result<(), ModemError>
    where
        R: Read + Send + 'static,
        W: AudioSink,
    {
        let idle_timeout = idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT);
        let (tx, rx) = mpsc::channel::<u8>();

        std::thread::spawn(move || {
            let mut byte = [0u8; 1];
            loop {
                match input.read(&mut byte) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(byte[0]).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let mut samples = Vec::new();
        self.write_leader(&mut samples);

        loop {
            match rx.recv_timeout(idle_timeout) {
                Ok(byte) => {
                    for word in self.codec.encode(byte) {
                        self.write_frame(&mut samples, word);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        self.write_trailer(&mut samples);
        sink.write_samples(&samples)?;
        sink.finish()
    }

    fn write_leader(&mut self, out: &mut Vec<f32>) {
        let n = (self.samples_per_bit * self.tx_leader_bits as f32).round() as usize;
        self.tone.tone(out, self.mark_freq, n);
    }

    fn write_trailer(&mut self, out: &mut Vec<f32>) {
        let n = (self.samples_per_bit * self.tx_trailer_bits as f32).round() as usize;
        self.tone.tone(out, self.mark_freq, n);
    }

    /// Writes one frame: start bit (space), `n_data_bits` data bits
    /// LSB-first (1 -> mark, 0 -> space), and `tx_stop_bits` stop bits
    /// (mark).
    fn write_frame(&mut self, out: &mut Vec<f32>, word: u32) {
        let bit_len = self.samples_per_bit.round() as usize;
        self.tone.tone(out, self.space_freq, bit_len);

        let n_data_bits = self.codec.n_data_bits();
        for i in 0..n_data_bits {
            let bit = (word >> i) & 1;
            let freq = if bit == 1 { self.mark_freq } else { self.space_freq };
            self.tone.tone(out, freq, bit_len);
        }

        let stop_len = (self.samples_per_bit * self.tx_stop_bits).round() as usize;
        self.tone.tone(out, self.mark_freq, stop_len);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemorySink;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn emits_nonempty_audio_for_a_message() {
        let config = Config::from_args(args("1200")).unwrap();
        let mut tl = TransmitLoop::new(&config);
        let mut sink = MemorySink::new(config.sample_rate);
        tl.run(b"Hi", &mut sink).unwrap();
        assert!(!sink.samples.is_empty());
        assert!(sink.samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn empty_input_still_emits_leader_and_trailer() {
        let config = Config::from_args(args("1200")).unwrap();
        let mut tl = TransmitLoop::new(&config);
        let mut sink = MemorySink::new(config.sample_rate);
        tl.run(b"", &mut sink).unwrap();
        assert!(!sink.samples.is_empty());
    }

    #[test]
    fn idle_timeout_stops_without_waiting_forever() {
        let config = Config::from_args(args("1200")).unwrap();
        let mut tl = TransmitLoop::new(&config);
        let mut sink = MemorySink::new(config.sample_rate);
        let input = std::io::Cursor::new(b"Hi".to_vec());
        tl.run_with_idle_timeout(input, &mut sink, Some(Duration::from_millis(50)))
            .unwrap();
        assert!(!sink.samples.is_empty());
    }
}
