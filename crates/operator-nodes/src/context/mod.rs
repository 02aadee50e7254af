//! Context operators
//!
//! Read fields of the evaluation context. Every output here is declared
//! `AlwaysPerPull`.

mod get_resolution;
mod get_time;
mod probes;

pub use get_resolution::GetResolutionOp;
pub use get_time::GetTimeOp;
pub use probes::{CameraOffsetProbeOp, ObjectPositionOp};
