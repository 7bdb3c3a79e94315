//! CLI entry point: parses arguments, then dispatches to the transmit or
//! receive loop over the selected audio backend.

use std::io::Read;
use std::process::ExitCode;

use minimodem::audio::{WavFileSink, WavFileSource};
#[cfg(feature = "audio-live")]
use minimodem::audio::{LiveInputStream, LiveOutputStream};
use minimodem::config::Config;
use minimodem::error::ModemError;
use minimodem::receive::ReceiveLoop;
use minimodem::transmit::TransmitLoop;

const USAGE: &str = "\
usage: minimodem [OPTIONS] {baudmode}

  baudmode is one of: a data rate in baud (e.g. \"1200\", \"300\"), or \"rtty\"

options:
  -t, --tx              transmit mode (default: receive)
  -r, --rx              receive mode
  -f, --file PATH       read/write audio from/to a WAV file instead of the
                         default audio device
  -M, --mark HZ         mark frequency
  -S, --space HZ        space frequency
  -b, --bandwidth HZ    analysis bandwidth per tone
  -8, --ascii           8-bit data bits (ASCII, default for non-rtty modes)
  -5, --baudot          5-bit data bits (Baudot/ITA2, default for rtty)
  -c, --confidence N    minimum confidence to accept a frame (default 2.0)
  -l, --limit N         confidence value that ends the search early
  -a, --auto-carrier    auto-detect carrier band via FFT before locking
  -T, --txstopbits N    transmit stop-bit length, in bits
  -R, --samplerate HZ   sample rate (default 48000)
  -q, --quiet           suppress carrier status lines on stderr
  --lut N               sine lookup table length (0 disables it)
  --float-samples       use 32-bit float WAV samples
  --benchmarks          run tone-generation benchmarks and exit
  -V, --version         print version and exit
";

fn version() -> String {
    format!("minimodem {}", env!("CARGO_PKG_VERSION"))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", USAGE);
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.version {
        println!("{}", version());
        return ExitCode::SUCCESS;
    }

    if config.benchmarks {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = minimodem::benchmark::run_benchmarks(config.sample_rate, &mut lock) {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), ModemError> {
    if config.tx_mode {
        run_transmit(config)
    } else {
        run_receive(config)
    }
}

fn run_transmit(config: &Config) -> Result<(), ModemError> {
    let mut loop_ = TransmitLoop::new(config);
    let stdin = std::io::stdin();
    let mut data = Vec::new();
    stdin.lock().read_to_end(&mut data)?;

    if let Some(path) = &config.file_path {
        let mut sink = WavFileSink::create(path, config.sample_rate)?;
        loop_.run(&data, &mut sink)
    } else {
        #[cfg(feature = "audio-live")]
        {
            let mut sink = LiveOutputStream::open(config.sample_rate)?;
            loop_.run(&data, &mut sink)
        }
        #[cfg(not(feature = "audio-live"))]
        {
            Err(ModemError::Resource(
                "no audio output backend available; build with --features audio-live or pass --file".into(),
            ))
        }
    }
}

fn run_receive(config: &Config) -> Result<(), ModemError> {
    let mut loop_ = ReceiveLoop::new(config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stderr = std::io::stderr();
    let mut status = stderr.lock();

    if let Some(path) = &config.file_path {
        let mut source = WavFileSource::open(path)?;
        loop_.run(&mut source, &mut out, &mut status)
    } else {
        #[cfg(feature = "audio-live")]
        {
            let mut source = LiveInputStream::open(config.sample_rate)?;
            loop_.run(&mut source, &mut out, &mut status)
        }
        #[cfg(not(feature = "audio-live"))]
        {
            Err(ModemError::Resource(
                "no audio input backend available; build with --features audio-live or pass --file".into(),
            ))
        }
    }
}

