//! Transform operators

mod object_transform;

pub use object_transform::{compose_transform, TransformOp};
