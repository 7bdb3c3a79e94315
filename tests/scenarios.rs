//! End-to-end transmit/receive scenarios, entirely in-memory.

use minimodem::audio::{MemorySink, MemorySource};
use minimodem::config::Config;
use minimodem::receive::ReceiveLoop;
use minimodem::transmit::TransmitLoop;

fn args(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

fn transmit(baudmode: &str, data: &[u8]) -> (Vec<f32>, Config) {
    let config = Config::from_args(args(baudmode)).unwrap();
    let mut tl = TransmitLoop::new(&config);
    let mut sink = MemorySink::new(config.sample_rate);
    tl.run(data, &mut sink).unwrap();
    (sink.samples, config)
}

fn receive(config: &Config, samples: Vec<f32>) -> (Vec<u8>, String) {
    let mut rl = ReceiveLoop::new(config).unwrap();
    let mut source = MemorySource::new(samples, config.sample_rate);
    let mut out = Vec::new();
    let mut status = Vec::new();
    rl.run(&mut source, &mut out, &mut status).unwrap();
    (out, String::from_utf8(status).unwrap())
}

/// S1: Bell 202 @ 1200 baud round-trips a short ASCII message, reporting
/// carrier acquisition on stderr.
#[test]
fn bell202_roundtrips_hello_world() {
    let (samples, config) = transmit("1200", b"Hello, World!\n");
    let (out, status) = receive(&config, samples);
    assert_eq!(out, b"Hello, World!\n");
    assert!(status.contains("CARRIER"));
}

/// S2: Bell 103 @ 300 baud round-trips a single alternating-bits byte.
#[test]
fn bell103_roundtrips_single_byte() {
    let (samples, config) = transmit("300", &[0x55]);
    let (out, _status) = receive(&config, samples);
    assert_eq!(out, vec![0x55]);
}

/// S3: RTTY Baudot round-trips two letters that need no shift.
#[test]
fn rtty_roundtrips_letters_without_shift() {
    let (samples, config) = transmit("rtty", b"RYRY");
    let (out, _status) = receive(&config, samples);
    assert_eq!(out, b"RYRY");
}

/// S4: RTTY inserts a FIGS shift before a digit and a LTRS shift before
/// the following letter, and the receiver recovers both characters.
#[test]
fn rtty_roundtrips_figs_then_letters_shift() {
    let (samples, config) = transmit("rtty", b"1A");
    let (out, _status) = receive(&config, samples);
    assert_eq!(out, b"1A");
}

/// S5: pure Gaussian noise produces no decoded output and no carrier
/// report.
#[test]
fn gaussian_noise_yields_no_output() {
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    let config = Config::from_args(args("1200")).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let normal = Normal::new(0.0f32, 0.2).unwrap();
    let samples: Vec<f32> = (0..config.sample_rate as usize * 2)
        .map(|_| normal.sample(&mut rng).clamp(-1.0, 1.0))
        .collect();

    let (out, status) = receive(&config, samples);
    assert!(out.is_empty());
    assert!(!status.contains("CARRIER"));
}

/// S6: two messages separated by a second of silence produce two
/// CARRIER/NOCARRIER report pairs bracketing two identical payloads.
#[test]
fn carrier_loss_and_reacquire_reports_two_pairs() {
    let (message, config) = transmit("1200", b"Hello, World!\n");
    let silence = vec![0.0f32; config.sample_rate as usize];

    let mut combined = message.clone();
    combined.extend_from_slice(&silence);
    combined.extend_from_slice(&message);

    let (out, status) = receive(&config, combined);
    assert_eq!(out, b"Hello, World!\nHello, World!\n");
    assert_eq!(status.matches("### CARRIER").count(), 2);
    assert_eq!(status.matches("### NOCARRIER").count(), 2);
}
