//! Vector Value Operators
//!
//! Vectors are assembled from one float input per component so that each
//! component can be overridden, keyframed or connected on its own.

use glam::{Vec2, Vec3};
use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

pub const PORT_X: &str = "x";
pub const PORT_Y: &str = "y";
pub const PORT_Z: &str = "z";
pub const PORT_RESULT: &str = "result";

/// Builds a `Vec2` from `x` and `y`
#[derive(Debug, Default)]
pub struct Vec2ValueOp;

impl OperatorDescriptor for Vec2ValueOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "vec2-value".to_string(),
            category: OperatorCategory::Value,
            label: "Vec2".to_string(),
            description: "Builds a 2D vector from its components".to_string(),
            inputs: vec![
                InputMetadata::new(PORT_X, "X", ValueType::Float),
                InputMetadata::new(PORT_Y, "Y", ValueType::Float),
            ],
            outputs: vec![OutputMetadata::new(PORT_RESULT, "Result", ValueType::Vec2)],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: Vec2ValueOp::descriptor,
    factory: || Box::new(Vec2ValueOp),
});

impl Operator for Vec2ValueOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let x = inputs.pull_float(PORT_X, ctx)?;
        let y = inputs.pull_float(PORT_Y, ctx)?;
        Ok(Value::Vec2(Vec2::new(x, y)))
    }
}

/// Builds a `Vec3` from `x`, `y` and `z`
#[derive(Debug, Default)]
pub struct Vec3ValueOp;

impl OperatorDescriptor for Vec3ValueOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "vec3-value".to_string(),
            category: OperatorCategory::Value,
            label: "Vec3".to_string(),
            description: "Builds a 3D vector from its components".to_string(),
            inputs: vec![
                InputMetadata::new(PORT_X, "X", ValueType::Float),
                InputMetadata::new(PORT_Y, "Y", ValueType::Float),
                InputMetadata::new(PORT_Z, "Z", ValueType::Float),
            ],
            outputs: vec![OutputMetadata::new(PORT_RESULT, "Result", ValueType::Vec3)],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: Vec3ValueOp::descriptor,
    factory: || Box::new(Vec3ValueOp),
});

impl Operator for Vec3ValueOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let x = inputs.pull_float(PORT_X, ctx)?;
        let y = inputs.pull_float(PORT_Y, ctx)?;
        let z = inputs.pull_float(PORT_Z, ctx)?;
        Ok(Value::Vec3(Vec3::new(x, y, z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let vec2 = Vec2ValueOp::descriptor();
        assert_eq!(vec2.operator_type, "vec2-value");
        assert_eq!(vec2.inputs.len(), 2);
        assert_eq!(vec2.outputs[0].value_type, ValueType::Vec2);

        let vec3 = Vec3ValueOp::descriptor();
        assert_eq!(vec3.inputs.len(), 3);
        assert_eq!(vec3.outputs[0].value_type, ValueType::Vec3);
    }
}
