//! Value operators
//!
//! Literal sources for scalars and vectors.

mod float_value;
mod int_value;
mod vector_value;

pub use float_value::FloatValueOp;
pub use int_value::IntValueOp;
pub use vector_value::{Vec2ValueOp, Vec3ValueOp};
