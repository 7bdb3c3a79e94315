pub mod error;
#[macro_use]
pub mod diag;
pub mod audio;
pub mod benchmark;
pub mod config;
pub mod framebits;
pub mod fsk;
pub mod receive;
pub mod tone;
pub mod transmit;

pub use config::Config;
pub use error::ModemError;
pub use fsk::FskPlan;
pub use receive::ReceiveLoop;
pub use transmit::TransmitLoop;
