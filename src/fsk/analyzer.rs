//! Streaming frame detector: scores mark-vs-space tone presence at many
//! candidate bit alignments and locks onto the best one.

use super::plan::FskPlan;

/// Sub-bit-width steps used both for the candidate-start stride and for
/// generating the small set of bit-width scale variants tried at each
/// start, so the analyzer can track slightly slow/fast signals.
pub const FSK_ANALYZE_NSTEPS: usize = 10;

/// Heavy penalty applied when the prev-stop/start/stop framing bits don't
/// look like mark/space/mark.
const FRAMING_VIOLATION_FACTOR: f32 = 0.1;

/// Floor applied to the "losing" tone's power before dividing, so silence
/// (both bands near zero) doesn't produce a division blowup.
const MIN_POWER_FLOOR: f32 = 1e-9;

/// Scale multipliers applied to `samples_per_bit` for each candidate
/// start, to track small timing drift (nominal, slightly slow, slightly
/// fast).
const SCALE_VARIANTS: [f32; 3] = [1.0, 1.0 + 1.0 / FSK_ANALYZE_NSTEPS as f32 / 2.0, 1.0 - 1.0 / FSK_ANALYZE_NSTEPS as f32 / 2.0];

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameResult {
    pub confidence: f32,
    pub bits: u32,
    pub frame_start_sample: usize,
}

/// `frame_nsamples = round(samples_per_bit * n_frame_bits)`.
pub fn frame_nsamples(plan: &FskPlan, samples_per_bit: f32) -> usize {
    (samples_per_bit * plan.n_frame_bits as f32).round() as usize
}

/// Scans candidate frame starts `try_first_sample, try_first_sample + step,
/// ...` up to `try_first_sample + try_max_nsamples`, and a small set of
/// bit-width scale variants per start, returning the best-scoring frame.
/// Confidence is 0 if `samples` is shorter than one frame.
pub fn find_frame(
    plan: &FskPlan,
    samples: &[f32],
    samples_per_bit: f32,
    try_first_sample: usize,
    try_max_nsamples: usize,
    try_step_nsamples: usize,
    confidence_search_limit: f32,
) -> FrameResult {
    let frame_len = frame_nsamples(plan, samples_per_bit);
    if samples.len() < frame_len {
        return FrameResult::default();
    }

    let step = try_step_nsamples.max(1);
    let mut best = FrameResult::default();

    let mut start = try_first_sample;
    loop {
        if start > try_first_sample + try_max_nsamples {
            break;
        }

        for &scale in &SCALE_VARIANTS {
            if let Some(candidate) = score_candidate(plan, samples, samples_per_bit * scale, start) {
                if candidate.confidence > best.confidence {
                    best = candidate;
                }
                if best.confidence >= confidence_search_limit {
                    return best;
                }
            }
        }

        start += step;
    }

    best
}

/// Computes mark/space power for every bit of a candidate frame starting
/// at `start`, using a single-bin Goertzel filter per bit interval.
/// Returns `None` if the candidate frame would run past the sample window.
fn score_candidate(
    plan: &FskPlan,
    samples: &[f32],
    bit_width: f32,
    start: usize,
) -> Option<FrameResult> {
    let n_frame_bits = plan.n_frame_bits as usize;
    let bit_len = bit_width.round().max(1.0) as usize;

    if start + bit_len * n_frame_bits > samples.len() {
        return None;
    }

    let mark_freq = plan.b_mark as f32 * plan.band_width;
    let space_freq = plan.b_space as f32 * plan.band_width;
    let sr = plan.sample_rate as f32;

    let mut bit_is_mark = vec![false; n_frame_bits];
    let mut bit_mark_power = vec![0.0f32; n_frame_bits];
    let mut bit_space_power = vec![0.0f32; n_frame_bits];

    for k in 0..n_frame_bits {
        let bit_start = start + (k as f32 * bit_width).round() as usize;
        let bit_samples = &samples[bit_start..bit_start + bit_len];
        let mark_power = goertzel_power(bit_samples, mark_freq, sr);
        let space_power = goertzel_power(bit_samples, space_freq, sr);
        bit_mark_power[k] = mark_power;
        bit_space_power[k] = space_power;
        bit_is_mark[k] = mark_power > space_power;
    }

    let prev_stop_ok = bit_is_mark[0];
    let start_ok = !bit_is_mark[1];
    let stop_ok = bit_is_mark[n_frame_bits - 1];
    let framing_ok = prev_stop_ok && start_ok && stop_ok;
    let framing_factor = if framing_ok { 1.0 } else { FRAMING_VIOLATION_FACTOR };

    let n_data_bits = plan.n_data_bits as usize;
    let mut snr_sum = 0.0f32;
    for k in 2..2 + n_data_bits {
        let (winning, losing) = if bit_is_mark[k] {
            (bit_mark_power[k], bit_space_power[k])
        } else {
            (bit_space_power[k], bit_mark_power[k])
        };
        snr_sum += winning / losing.max(MIN_POWER_FLOOR);
    }
    let confidence = (snr_sum / n_data_bits as f32) * framing_factor;

    let mut bits: u32 = 0;
    for (k, &is_mark) in bit_is_mark.iter().enumerate() {
        if is_mark {
            bits |= 1 << k;
        }
    }

    Some(FrameResult {
        confidence,
        bits,
        frame_start_sample: start,
    })
}

/// Single-bin Goertzel power at `freq_hz` over `samples`.
fn goertzel_power(samples: &[f32], freq_hz: f32, sample_rate: f32) -> f32 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    let omega = 2.0 * std::f32::consts::PI * freq_hz / sample_rate;
    let coeff = 2.0 * omega.cos();

    let mut s_prev = 0.0f32;
    let mut s_prev2 = 0.0f32;
    for &x in samples {
        let s = x + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }
    let power = s_prev2 * s_prev2 + s_prev * s_prev - coeff * s_prev * s_prev2;
    power.max(0.0) / (n as f32 * n as f32)
}
