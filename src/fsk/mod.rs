pub mod analyzer;
pub mod carrier;
pub mod plan;

pub use analyzer::{find_frame, frame_nsamples, FrameResult, FSK_ANALYZE_NSTEPS};
pub use carrier::detect_carrier;
pub use plan::FskPlan;
