//! Transform probes
//!
//! Read the translation part of the context's camera and object matrices.
//! Useful for placing things relative to the viewer and for checking what
//! a repeating or transforming parent handed down.

use operator_engine::{
    EvaluationContext, Inputs, Operator, OperatorCategory, OperatorDescriptor, OperatorMetadata,
    OutputMetadata, Result, Value, ValueType,
};

pub const PORT_OFFSET: &str = "offset";
pub const PORT_POSITION: &str = "position";

/// Translation of `world_to_camera`
#[derive(Debug, Default)]
pub struct CameraOffsetProbeOp;

impl OperatorDescriptor for CameraOffsetProbeOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "camera-offset-probe".to_string(),
            category: OperatorCategory::Context,
            label: "Camera Offset".to_string(),
            description: "Translation of the current world-to-camera matrix".to_string(),
            inputs: Vec::new(),
            outputs: vec![OutputMetadata::new(PORT_OFFSET, "Offset", ValueType::Vec3).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: CameraOffsetProbeOp::descriptor,
    factory: || Box::new(CameraOffsetProbeOp),
});

impl Operator for CameraOffsetProbeOp {
    fn compute(
        &mut self,
        _output: &str,
        _inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        Ok(Value::Vec3(ctx.world_to_camera.w_axis.truncate()))
    }
}

/// Translation of `object_to_world`
#[derive(Debug, Default)]
pub struct ObjectPositionOp;

impl OperatorDescriptor for ObjectPositionOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "get-object-position".to_string(),
            category: OperatorCategory::Context,
            label: "Object Position".to_string(),
            description: "Translation of the current object-to-world matrix".to_string(),
            inputs: Vec::new(),
            outputs: vec![OutputMetadata::new(PORT_POSITION, "Position", ValueType::Vec3).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: ObjectPositionOp::descriptor,
    factory: || Box::new(ObjectPositionOp),
});

impl Operator for ObjectPositionOp {
    fn compute(
        &mut self,
        _output: &str,
        _inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        Ok(Value::Vec3(ctx.object_to_world.w_axis.truncate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use operator_engine::TriggerPolicy;

    #[test]
    fn test_probes_are_context_sensitive() {
        for meta in [CameraOffsetProbeOp::descriptor(), ObjectPositionOp::descriptor()] {
            assert_eq!(meta.category, OperatorCategory::Context);
            assert_eq!(meta.outputs[0].trigger, TriggerPolicy::AlwaysPerPull);
        }
    }
}
