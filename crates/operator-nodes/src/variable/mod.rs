//! Variable operators
//!
//! Producers bind named variables in the evaluation context around the
//! pull of a subgraph; consumers inside that subgraph read them.

mod float_variable;
mod object_variable;

pub use float_variable::{GetFloatVariableOp, SetFloatVariableOp};
pub use object_variable::{GetObjectVariableOp, SetObjectVariableOp};
