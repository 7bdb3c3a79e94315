//! Carrier auto-detection: scan a sample chunk for the dominant tone bin.

use rustfft::{num_complex::Complex, FftPlanner};

use super::plan::FskPlan;

/// Scans `samples[..n]` for the strongest frequency bin. If its power as a
/// fraction of total spectral energy exceeds `threshold`, returns that
/// bin's frequency expressed as a `plan.band_width`-scaled index (the
/// units `set_tones_by_bandshift`/`b_mark*band_width` expect); otherwise
/// `None`.
pub fn detect_carrier(plan: &FskPlan, samples: &[f32], n: usize, threshold: f32) -> Option<i32> {
    if threshold <= 0.0 || n == 0 || n > samples.len() {
        return None;
    }

    let mut buffer: Vec<Complex<f32>> = samples[..n]
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .collect();
    buffer.resize(plan.fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(plan.fft_size);
    fft.process(&mut buffer);

    let half = plan.fft_size / 2;
    let power: Vec<f32> = buffer[..half].iter().map(|c| c.norm_sqr()).collect();

    let total: f32 = power.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let (best_bin, &best_power) = power
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())?;

    // Fraction of total spectral energy concentrated in the strongest bin.
    // A pure tone concentrates nearly all energy in one bin; noise spreads
    // it roughly evenly across `half` bins, giving a fraction near 1/half.
    let normalized_power = best_power / total;

    if normalized_power > threshold {
        let bin_hz = best_bin as f32 * plan.sample_rate as f32 / plan.fft_size as f32;
        Some((bin_hz / plan.band_width).round() as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_dominant_tone() {
        let plan = FskPlan::new(48000, 1200.0, 2200.0, 200.0, 8).unwrap();
        let n = plan.fft_size;
        let samples: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 1200.0 * i as f32 / 48000.0).sin())
            .collect();
        let band = detect_carrier(&plan, &samples, n, 0.01).expect("should detect a band");
        assert_eq!(band, plan.b_mark);
    }

    #[test]
    fn silence_does_not_cross_threshold() {
        let plan = FskPlan::new(48000, 1200.0, 2200.0, 200.0, 8).unwrap();
        let n = plan.fft_size;
        let samples = vec![0.0f32; n];
        assert!(detect_carrier(&plan, &samples, n, 0.001).is_none());
    }
}
