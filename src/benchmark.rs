//! `--benchmarks`: synthesizes alternating test tones with and without the
//! sine lookup table and reports timing, for comparing tone-generation
//! cost across machines. No audio device or file is touched.

use std::io::Write;
use std::time::Instant;

use crate::error::ModemError;

const TEST_TONE_A_HZ: f32 = 1000.0;
const TEST_TONE_B_HZ: f32 = 1777.0;
const TEST_TONE_NSECONDS: u32 = 1;
const TEST_LUT_LEN: usize = 4096;

/// Generates `n_seconds` of alternating `TEST_TONE_A_HZ`/`TEST_TONE_B_HZ`
/// tones, once with a precomputed sine table and once without, and writes
/// a short timing report to `out`.
pub fn run_benchmarks<W: Write>(sample_rate: u32, out: &mut W) -> Result<(), ModemError> {
    writeln!(out, "minimodem benchmarks: sample_rate={}", sample_rate)?;
    if let Some(model) = cpu_model() {
        writeln!(out, "cpu: {}", model)?;
    }

    let (with_lut_elapsed, n_samples) = time_tone_generation(sample_rate, TEST_LUT_LEN);
    let (no_lut_elapsed, _) = time_tone_generation(sample_rate, 0);

    writeln!(
        out,
        "generated {} samples with LUT in {:.6}s ({:.1} samples/sec)",
        n_samples,
        with_lut_elapsed.as_secs_f64(),
        n_samples as f64 / with_lut_elapsed.as_secs_f64().max(f64::EPSILON)
    )?;
    writeln!(
        out,
        "generated {} samples without LUT in {:.6}s ({:.1} samples/sec)",
        n_samples,
        no_lut_elapsed.as_secs_f64(),
        n_samples as f64 / no_lut_elapsed.as_secs_f64().max(f64::EPSILON)
    )?;

    Ok(())
}

fn time_tone_generation(sample_rate: u32, lut_len: usize) -> (std::time::Duration, usize) {
    let mut gen = crate::tone::ToneGenerator::new(sample_rate, lut_len);
    let n = (sample_rate * TEST_TONE_NSECONDS) as usize;
    let half = n / 2;

    let start = Instant::now();
    let mut buf = Vec::with_capacity(n);
    gen.tone(&mut buf, TEST_TONE_A_HZ, half);
    gen.tone(&mut buf, TEST_TONE_B_HZ, n - half);
    let elapsed = start.elapsed();

    (elapsed, buf.len())
}

/// Best-effort CPU model string from `/proc/cpuinfo`. Returns `None`
/// (never errors) on platforms without it.
fn cpu_model() -> Option<String> {
    let contents = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    contents
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split(':').nth(1))
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmarks_write_a_nonempty_report() {
        let mut out = Vec::new();
        run_benchmarks(48000, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("minimodem benchmarks"));
        assert!(text.contains("samples/sec"));
    }

    #[test]
    fn cpu_model_never_panics() {
        let _ = cpu_model();
    }
}
