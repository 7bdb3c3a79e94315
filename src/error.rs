use std::fmt;

/// Errors that can occur while configuring or running the modem.
#[derive(Debug)]
pub enum ModemError {
    Config(String),
    PlanInvalid(String),
    Resource(String),
    Audio(String),
    Io(std::io::Error),
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModemError::Config(msg) => write!(f, "usage error: {}", msg),
            ModemError::PlanInvalid(msg) => write!(f, "invalid fsk plan: {}", msg),
            ModemError::Resource(msg) => write!(f, "resource error: {}", msg),
            ModemError::Audio(msg) => write!(f, "audio error: {}", msg),
            ModemError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ModemError {}

impl From<std::io::Error> for ModemError {
    fn from(err: std::io::Error) -> Self {
        ModemError::Io(err)
    }
}
