//! Animation operators

mod curve_sample;

pub use curve_sample::{curve_from_keys, CurveSampleOp};
