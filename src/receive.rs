//! Receive loop: streaming carrier acquisition, frame detection, and
//! frame-bits decoding.

use std::io::Write;

use crate::audio::AudioSource;
use crate::config::Config;
use crate::debug_log;
use crate::error::ModemError;
use crate::framebits::FrameCodec;
use crate::fsk::{detect_carrier, find_frame, frame_nsamples, FskPlan, FSK_ANALYZE_NSTEPS};

/// Carrier acquisition state. Mirrors the SEARCHING/LOCKED framing used by
/// the original tool's report lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CarrierState {
    Searching,
    Locked,
}

/// Caps how many consecutive low-confidence frames are tolerated before a
/// locked carrier is declared lost.
const NOCONFIDENCE_STREAK_LIMIT: u32 = 20;

pub struct ReceiveLoop {
    plan: FskPlan,
    samples_per_bit: f32,
    data_rate: f32,
    codec: FrameCodec,
    confidence_threshold: f32,
    confidence_search_limit: f32,
    carrier_autodetect_threshold: f32,
    autodetect_shift: i32,
    quiet: bool,

    state: CarrierState,
    noconfidence_streak: u32,
    carrier_nsamples: u64,
    nframes_decoded: u64,
    confidence_total: f64,
}

impl ReceiveLoop {
    pub fn new(config: &Config) -> Result<Self, ModemError> {
        let plan = FskPlan::new(
            config.sample_rate,
            config.mark_freq,
            config.space_freq,
            config.band_width,
            config.n_data_bits,
        )?;
        let samples_per_bit = config.sample_rate as f32 / config.data_rate;

        Ok(Self {
            plan,
            samples_per_bit,
            data_rate: config.data_rate,
            codec: FrameCodec::new(config.n_data_bits),
            confidence_threshold: config.confidence_threshold,
            confidence_search_limit: config.confidence_search_limit,
            carrier_autodetect_threshold: config.carrier_autodetect_threshold,
            autodetect_shift: config.autodetect_shift,
            quiet: config.quiet,
            state: CarrierState::Searching,
            noconfidence_streak: 0,
            carrier_nsamples: 0,
            nframes_decoded: 0,
            confidence_total: 0.0,
        })
    }

    pub fn nframes_decoded(&self) -> u64 {
        self.nframes_decoded
    }

    /// Runs the receive loop to completion (source exhaustion), writing
    /// decoded bytes to `out` and carrier status lines to `status` (stderr
    /// in the CLI, unless `quiet`).
    pub fn run<S: AudioSource, W: Write, E: Write>(
        &mut self,
        source: &mut S,
        out: &mut W,
        status: &mut E,
    ) -> Result<(), ModemError> {
        let frame_len = frame_nsamples(&self.plan, self.samples_per_bit);
        let try_max_nsamples = self.samples_per_bit.ceil() as usize;
        let try_step_nsamples = ((self.samples_per_bit / FSK_ANALYZE_NSTEPS as f32).floor() as usize).max(1);
        let overscan = (self.samples_per_bit * 0.5).round().max(1.0) as usize;

        let window_len = frame_len + try_max_nsamples + overscan;
        let mut buf: Vec<f32> = Vec::with_capacity(window_len);
        let mut read_buf = vec![0.0f32; window_len];
        let mut source_exhausted = false;

        self.fill(&mut buf, window_len, source, &mut read_buf, &mut source_exhausted)?;

        if self.carrier_autodetect_threshold > 0.0 && !buf.is_empty() {
            let n = buf.len().min(self.plan.fft_size);
            if let Some(band) = detect_carrier(&self.plan, &buf, n, self.carrier_autodetect_threshold) {
                debug_log!("autodetected carrier band {}", band);
                self.plan.set_tones_by_bandshift(band, self.autodetect_shift)?;
            }
        }

        while buf.len() >= frame_len {
            let (try_first_sample, confidence_search_limit) = match self.state {
                CarrierState::Searching => (0, f32::INFINITY),
                CarrierState::Locked => (overscan, self.confidence_search_limit),
            };

            let result = find_frame(
                &self.plan,
                &buf,
                self.samples_per_bit,
                try_first_sample,
                try_max_nsamples,
                try_step_nsamples,
                confidence_search_limit,
            );

            let advance = if result.confidence >= self.confidence_threshold {
                self.on_frame_decoded(&result, out, status)?;
                (result.frame_start_sample
                    + (self.samples_per_bit * (self.plan.n_data_bits as f32 + 2.0)).round() as usize)
                    .saturating_sub(overscan)
                    .max(1)
            } else {
                self.on_no_confidence(status)?;
                try_max_nsamples
            };

            buf.drain(..advance.min(buf.len()));
            if source_exhausted && buf.len() < frame_len {
                break;
            }
            self.fill(&mut buf, window_len, source, &mut read_buf, &mut source_exhausted)?;
        }

        if self.state == CarrierState::Locked {
            self.report_no_carrier(status)?;
        }

        Ok(())
    }

    fn fill<S: AudioSource>(
        &self,
        buf: &mut Vec<f32>,
        target_len: usize,
        source: &mut S,
        scratch: &mut [f32],
        exhausted: &mut bool,
    ) -> Result<(), ModemError> {
        while buf.len() < target_len && !*exhausted {
            let want = (target_len - buf.len()).min(scratch.len());
            let n = source.read(&mut scratch[..want])?;
            if n == 0 {
                *exhausted = true;
                break;
            }
            buf.extend_from_slice(&scratch[..n]);
        }
        Ok(())
    }

    fn on_frame_decoded<W: Write, E: Write>(
        &mut self,
        result: &crate::fsk::FrameResult,
        out: &mut W,
        status: &mut E,
    ) -> Result<(), ModemError> {
        if self.state == CarrierState::Searching {
            self.state = CarrierState::Locked;
            self.codec.reset();
            self.carrier_nsamples = 0;
            self.report_carrier(status)?;
        }
        self.noconfidence_streak = 0;
        self.nframes_decoded += 1;
        self.confidence_total += result.confidence as f64;
        self.carrier_nsamples += frame_nsamples(&self.plan, self.samples_per_bit) as u64;

        let data_bits = (result.bits >> 2) & ((1u32 << self.plan.n_data_bits) - 1);
        let bytes = self.codec.decode(data_bits);
        for b in bytes {
            let printable = if b.is_ascii_graphic() || b.is_ascii_whitespace() { b } else { b'.' };
            out.write_all(&[printable])?;
        }
        out.flush()?;
        Ok(())
    }

    fn on_no_confidence<E: Write>(&mut self, status: &mut E) -> Result<(), ModemError> {
        if self.state == CarrierState::Locked {
            self.noconfidence_streak += 1;
            if self.noconfidence_streak > NOCONFIDENCE_STREAK_LIMIT {
                self.state = CarrierState::Searching;
                self.report_no_carrier(status)?;
            }
        }
        Ok(())
    }

    fn report_carrier<E: Write>(&self, status: &mut E) -> Result<(), ModemError> {
        if self.quiet {
            return Ok(());
        }
        let mark_hz = self.plan.b_mark as f32 * self.plan.band_width;
        if self.data_rate >= 100.0 {
            writeln!(status, "### CARRIER {} @ {:.1} Hz ###", (self.data_rate + 0.5) as u32, mark_hz)?;
        } else {
            writeln!(status, "### CARRIER {:.2} @ {:.1} Hz ###", self.data_rate, mark_hz)?;
        }
        Ok(())
    }

    fn report_no_carrier<E: Write>(&self, status: &mut E) -> Result<(), ModemError> {
        if self.quiet {
            return Ok(());
        }
        let nbits_total = self.nframes_decoded * (self.plan.n_data_bits as u64 + 2);
        let avg_confidence = if self.nframes_decoded > 0 {
            self.confidence_total / self.nframes_decoded as f64
        } else {
            0.0
        };
        let throughput_rate = if self.carrier_nsamples > 0 {
            nbits_total as f64 * self.plan.sample_rate as f64 / self.carrier_nsamples as f64
        } else {
            0.0
        };
        write!(
            status,
            "### NOCARRIER ndata={} confidence={:.3} throughput={:.2}",
            self.nframes_decoded, avg_confidence, throughput_rate
        )?;

        let expected_nsamples = (nbits_total as f64 * self.samples_per_bit as f64 + 0.5) as u64;
        if expected_nsamples == self.carrier_nsamples {
            writeln!(status, " (rate perfect) ###")?;
        } else {
            let throughput_skew = (throughput_rate - self.data_rate as f64) / self.data_rate as f64;
            writeln!(
                status,
                " ({:.1}% {}) ###",
                throughput_skew.abs() * 100.0,
                if throughput_skew.is_sign_negative() { "slow" } else { "fast" }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemorySource;
    use crate::config::Config;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn sine(freq: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn encode_bell202_byte(byte: u8, sample_rate: f32, data_rate: f32) -> Vec<f32> {
        let samples_per_bit = (sample_rate / data_rate).round() as usize;
        let mut bits = vec![1u8, 0u8];
        for i in 0..8 {
            bits.push((byte >> i) & 1);
        }
        bits.push(1);

        let mut samples = Vec::new();
        for &b in &bits {
            let freq = if b == 1 { 1200.0 } else { 2200.0 };
            samples.extend(sine(freq, sample_rate, samples_per_bit));
        }
        samples
    }

    #[test]
    fn decodes_clean_bell202_byte() {
        let config = Config::from_args(args("1200")).unwrap();
        let mut rl = ReceiveLoop::new(&config).unwrap();

        let mut samples = vec![0.0f32; 200];
        samples.extend(encode_bell202_byte(0x55, 48000.0, 1200.0));
        samples.extend(vec![0.0f32; 200]);

        let mut source = MemorySource::new(samples, 48000);
        let mut out = Vec::new();
        let mut status = Vec::new();
        rl.run(&mut source, &mut out, &mut status).unwrap();

        assert_eq!(out, vec![0x55]);
        assert!(rl.nframes_decoded() >= 1);
    }

    #[test]
    fn pure_silence_decodes_nothing() {
        let config = Config::from_args(args("1200")).unwrap();
        let mut rl = ReceiveLoop::new(&config).unwrap();
        let samples = vec![0.0f32; 48000];
        let mut source = MemorySource::new(samples, 48000);
        let mut out = Vec::new();
        let mut status = Vec::new();
        rl.run(&mut source, &mut out, &mut status).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn decodes_multi_byte_message_without_losing_framing() {
        use crate::transmit::TransmitLoop;
        use crate::audio::MemorySink;

        let config = Config::from_args(args("1200")).unwrap();
        let mut tl = TransmitLoop::new(&config);
        let mut sink = MemorySink::new(config.sample_rate);
        tl.run(b"Hello, World!\n", &mut sink).unwrap();

        let mut rl = ReceiveLoop::new(&config).unwrap();
        let mut source = MemorySource::new(sink.samples, config.sample_rate);
        let mut out = Vec::new();
        let mut status = Vec::new();
        rl.run(&mut source, &mut out, &mut status).unwrap();

        assert_eq!(out, b"Hello, World!\n");
    }

    #[test]
    fn carrier_reports_are_suppressed_when_quiet() {
        let mut config = Config::from_args(args("1200")).unwrap();
        config.quiet = true;
        let mut rl = ReceiveLoop::new(&config).unwrap();

        let mut samples = vec![0.0f32; 200];
        samples.extend(encode_bell202_byte(0x55, 48000.0, 1200.0));
        samples.extend(vec![0.0f32; 200]);

        let mut source = MemorySource::new(samples, 48000);
        let mut out = Vec::new();
        let mut status = Vec::new();
        rl.run(&mut source, &mut out, &mut status).unwrap();
        assert!(status.is_empty());
    }
}
