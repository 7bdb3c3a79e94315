//! Configuration: immutable-after-start-up session parameters, CLI
//! parsing, and baudmode presets.

use crate::error::ModemError;

pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 2.0;
pub const DEFAULT_CONFIDENCE_SEARCH_LIMIT: f32 = 2.3;
pub const DEFAULT_LEADER_BITS: u32 = 2;
pub const DEFAULT_TRAILER_BITS: u32 = 2;
pub const DEFAULT_TX_SIN_TABLE_LEN: usize = 4096;
pub const AUTO_CARRIER_THRESHOLD: f32 = 0.001;

/// Session configuration, constructed once from CLI arguments (or built
/// directly by library callers) and never mutated afterward.
#[derive(Debug, Clone)]
pub struct Config {
    pub tx_mode: bool,
    pub sample_rate: u32,
    pub mark_freq: f32,
    pub space_freq: f32,
    pub data_rate: f32,
    pub n_data_bits: u32,
    pub band_width: f32,
    pub tx_stop_bits: f32,
    pub tx_leader_bits: u32,
    pub tx_trailer_bits: u32,
    pub confidence_threshold: f32,
    pub confidence_search_limit: f32,
    pub carrier_autodetect_threshold: f32,
    pub autodetect_shift: i32,
    pub tx_sin_table_len: usize,
    pub quiet: bool,
    pub file_path: Option<String>,
    pub float_samples: bool,
    pub benchmarks: bool,
    pub version: bool,
}

impl Config {
    /// Parses `argv[1..]`-style arguments into a `Config`, applying the
    /// Bell 202 / Bell 103 / RTTY baudmode presets of spec.md §6 to any
    /// field the caller didn't explicitly override.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ModemError> {
        let mut tx_mode: Option<bool> = None;
        let mut quiet = false;
        let mut band_width: Option<f32> = None;
        let mut mark_freq: Option<f32> = None;
        let mut space_freq: Option<f32> = None;
        let mut tx_stop_bits: Option<f32> = None;
        let mut n_data_bits: Option<u32> = None;
        let mut carrier_autodetect_threshold = 0.0f32;
        let mut confidence_threshold = DEFAULT_CONFIDENCE_THRESHOLD;
        let mut confidence_search_limit = DEFAULT_CONFIDENCE_SEARCH_LIMIT;
        let mut sample_rate = DEFAULT_SAMPLE_RATE;
        let mut tx_sin_table_len = DEFAULT_TX_SIN_TABLE_LEN;
        let mut float_samples = false;
        let mut file_path: Option<String> = None;
        let mut benchmarks = false;
        let mut version = false;
        let mut modem_mode: Option<String> = None;

        let args: Vec<String> = args.into_iter().collect();
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut take_value = |i: &mut usize| -> Result<String, ModemError> {
                *i += 1;
                args.get(*i)
                    .cloned()
                    .ok_or_else(|| ModemError::Config(format!("{} requires a value", arg)))
            };

            match arg {
                "-V" | "--version" => version = true,
                "-t" | "--tx" | "--transmit" | "--write" => {
                    if tx_mode == Some(false) {
                        return Err(ModemError::Config("conflicting --tx/--rx".into()));
                    }
                    tx_mode = Some(true);
                }
                "-r" | "--rx" | "--receive" | "--read" => {
                    if tx_mode == Some(true) {
                        return Err(ModemError::Config("conflicting --tx/--rx".into()));
                    }
                    tx_mode = Some(false);
                }
                "-c" | "--confidence" => {
                    confidence_threshold = parse_f32(&take_value(&mut i)?, "--confidence")?;
                }
                "-l" | "--limit" => {
                    confidence_search_limit = parse_f32(&take_value(&mut i)?, "--limit")?;
                }
                "-a" | "--auto-carrier" => {
                    carrier_autodetect_threshold = AUTO_CARRIER_THRESHOLD;
                }
                "-8" | "--ascii" => n_data_bits = Some(8),
                "-5" | "--baudot" => n_data_bits = Some(5),
                "-f" | "--file" => file_path = Some(take_value(&mut i)?),
                "-b" | "--bandwidth" => {
                    let v = parse_f32(&take_value(&mut i)?, "--bandwidth")?;
                    if v == 0.0 {
                        return Err(ModemError::Config("--bandwidth must be nonzero".into()));
                    }
                    band_width = Some(v);
                }
                "-M" | "--mark" => {
                    let v = parse_f32(&take_value(&mut i)?, "--mark")?;
                    if v <= 0.0 {
                        return Err(ModemError::Config("--mark must be positive".into()));
                    }
                    mark_freq = Some(v);
                }
                "-S" | "--space" => {
                    let v = parse_f32(&take_value(&mut i)?, "--space")?;
                    if v <= 0.0 {
                        return Err(ModemError::Config("--space must be positive".into()));
                    }
                    space_freq = Some(v);
                }
                "-T" | "--txstopbits" => {
                    let v = parse_f32(&take_value(&mut i)?, "--txstopbits")?;
                    if v <= 0.0 {
                        return Err(ModemError::Config("--txstopbits must be positive".into()));
                    }
                    tx_stop_bits = Some(v);
                }
                "-q" | "--quiet" => quiet = true,
                "-R" | "--samplerate" => {
                    let v: u32 = take_value(&mut i)?
                        .parse()
                        .map_err(|_| ModemError::Config("invalid --samplerate".into()))?;
                    if v == 0 {
                        return Err(ModemError::Config("--samplerate must be positive".into()));
                    }
                    sample_rate = v;
                }
                "-A" | "--alsa" => { /* cpal's default host selection already covers this */ }
                "--lut" => {
                    tx_sin_table_len = take_value(&mut i)?
                        .parse()
                        .map_err(|_| ModemError::Config("invalid --lut".into()))?;
                }
                "--float-samples" => float_samples = true,
                "--benchmarks" => benchmarks = true,
                other if !other.starts_with('-') => {
                    if modem_mode.is_some() {
                        return Err(ModemError::Config("unexpected extra argument".into()));
                    }
                    modem_mode = Some(other.to_string());
                }
                other => return Err(ModemError::Config(format!("unknown option: {}", other))),
            }
            i += 1;
        }

        if version || benchmarks {
            return Ok(Self {
                tx_mode: false,
                sample_rate,
                mark_freq: 0.0,
                space_freq: 0.0,
                data_rate: 0.0,
                n_data_bits: 8,
                band_width: 0.0,
                tx_stop_bits: 1.0,
                tx_leader_bits: DEFAULT_LEADER_BITS,
                tx_trailer_bits: DEFAULT_TRAILER_BITS,
                confidence_threshold,
                confidence_search_limit,
                carrier_autodetect_threshold,
                autodetect_shift: 0,
                tx_sin_table_len,
                quiet,
                file_path,
                float_samples,
                benchmarks,
                version,
            });
        }

        let modem_mode = modem_mode
            .ok_or_else(|| ModemError::Config("must specify {baudmode} (try \"300\")".into()))?;

        let preset = BaudmodePreset::resolve(&modem_mode)?;

        let n_data_bits = n_data_bits.unwrap_or(preset.default_n_data_bits);
        let mark_freq = mark_freq.unwrap_or(preset.mark_freq);
        let space_freq = space_freq.unwrap_or(mark_freq - preset.autodetect_shift as f32);
        let mut band_width = band_width.unwrap_or(preset.band_width);
        let tx_stop_bits = tx_stop_bits.unwrap_or(preset.tx_stop_bits);

        // band_width is restricted to <= data rate.
        if band_width > preset.data_rate {
            band_width = preset.data_rate;
        }

        // Auto-raise the search limit so it's never below the squelch threshold.
        if confidence_search_limit < confidence_threshold {
            confidence_search_limit = confidence_threshold;
        }

        let tx_mode = tx_mode.unwrap_or(false);

        Ok(Self {
            tx_mode,
            sample_rate,
            mark_freq,
            space_freq,
            data_rate: preset.data_rate,
            n_data_bits,
            band_width,
            tx_stop_bits,
            tx_leader_bits: DEFAULT_LEADER_BITS,
            tx_trailer_bits: DEFAULT_TRAILER_BITS,
            confidence_threshold,
            confidence_search_limit,
            carrier_autodetect_threshold,
            autodetect_shift: preset.autodetect_shift,
            tx_sin_table_len,
            quiet,
            file_path,
            float_samples,
            benchmarks,
            version,
        })
    }
}

fn parse_f32(s: &str, opt: &str) -> Result<f32, ModemError> {
    s.parse()
        .map_err(|_| ModemError::Config(format!("invalid value for {}: {}", opt, s)))
}

/// A baudmode's default parameters, applied only where the user didn't
/// override them. See spec.md §6's Bell 202 / Bell 103 / RTTY table.
struct BaudmodePreset {
    data_rate: f32,
    default_n_data_bits: u32,
    mark_freq: f32,
    autodetect_shift: i32,
    band_width: f32,
    tx_stop_bits: f32,
}

impl BaudmodePreset {
    fn resolve(modem_mode: &str) -> Result<Self, ModemError> {
        if modem_mode.eq_ignore_ascii_case("rtty") {
            return Ok(Self {
                data_rate: 45.45,
                default_n_data_bits: 5,
                mark_freq: 1585.0,
                autodetect_shift: 170,
                band_width: 10.0,
                tx_stop_bits: 1.5,
            });
        }

        let data_rate: f32 = modem_mode
            .parse()
            .map_err(|_| ModemError::Config(format!("invalid baudmode: {}", modem_mode)))?;
        if data_rate == 0.0 {
            return Err(ModemError::Config("baudmode data rate must be nonzero".into()));
        }

        if data_rate >= 400.0 {
            // Bell 202: baud=1200 mark=1200 space=2200
            Ok(Self {
                data_rate,
                default_n_data_bits: 8,
                mark_freq: data_rate / 2.0 + 600.0,
                autodetect_shift: -((data_rate * 5.0 / 6.0) as i32),
                band_width: 200.0,
                tx_stop_bits: 1.0,
            })
        } else if data_rate >= 100.0 {
            // Bell 103: baud=300 mark=1270 space=1070
            Ok(Self {
                data_rate,
                default_n_data_bits: 8,
                mark_freq: 1270.0,
                autodetect_shift: 200,
                band_width: 50.0,
                tx_stop_bits: 1.0,
            })
        } else {
            // RTTY: baud=45.45 mark/space variable, shift=-170
            Ok(Self {
                data_rate,
                default_n_data_bits: 8,
                mark_freq: 1585.0,
                autodetect_shift: 170,
                band_width: 10.0,
                tx_stop_bits: 1.0,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn bell202_preset_applies() {
        let cfg = Config::from_args(args("1200")).unwrap();
        assert_eq!(cfg.data_rate, 1200.0);
        assert_eq!(cfg.mark_freq, 1200.0);
        assert_eq!(cfg.space_freq, 2200.0);
        assert_eq!(cfg.band_width, 200.0);
        assert_eq!(cfg.n_data_bits, 8);
    }

    #[test]
    fn bell103_preset_applies() {
        let cfg = Config::from_args(args("300")).unwrap();
        assert_eq!(cfg.mark_freq, 1270.0);
        assert_eq!(cfg.space_freq, 1070.0);
        assert_eq!(cfg.band_width, 50.0);
    }

    #[test]
    fn rtty_preset_applies() {
        let cfg = Config::from_args(args("rtty")).unwrap();
        assert_eq!(cfg.n_data_bits, 5);
        assert_eq!(cfg.tx_stop_bits, 1.5);
        assert!((cfg.data_rate - 45.45).abs() < 1e-6);
    }

    #[test]
    fn explicit_overrides_win_over_preset() {
        let cfg = Config::from_args(args("-M 1300 -S 2300 1200")).unwrap();
        assert_eq!(cfg.mark_freq, 1300.0);
        assert_eq!(cfg.space_freq, 2300.0);
    }

    #[test]
    fn search_limit_is_auto_raised() {
        let cfg = Config::from_args(args("-c 5 -l 1 1200")).unwrap();
        assert!(cfg.confidence_search_limit >= cfg.confidence_threshold);
    }

    #[test]
    fn missing_baudmode_is_a_config_error() {
        assert!(Config::from_args(args("-q")).is_err());
    }

    #[test]
    fn conflicting_tx_rx_is_a_config_error() {
        assert!(Config::from_args(args("-t -r 1200")).is_err());
    }

    #[test]
    fn bandwidth_clamped_to_data_rate() {
        let cfg = Config::from_args(args("-b 1000 45")).unwrap();
        assert!(cfg.band_width <= cfg.data_rate);
    }
}
