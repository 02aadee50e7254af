//! Transform Operator
//!
//! Applies scale, rotation and translation to `object_to_world` around the
//! pull of its `command` input. Editors drive its inputs with a gizmo
//! through the [`Transformable`] capability.

use glam::{EulerRot, Mat4, Quat, Vec3};
use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, TransformInputs, Transformable, Value, ValueType,
};

/// Local transform matrix; `rotation` is XYZ Euler angles in degrees
pub fn compose_transform(translation: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Quat::from_euler(
        EulerRot::XYZ,
        rotation.x.to_radians(),
        rotation.y.to_radians(),
        rotation.z.to_radians(),
    );
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Transform Operator
///
/// # Inputs
/// - `command` - Subgraph evaluated in the transformed space
/// - `translation` - Offset (default zero)
/// - `rotation` - Euler angles in degrees (default zero)
/// - `scale` - Per-axis scale (default one)
///
/// # Outputs
/// - `result` - Whatever `command` produced
#[derive(Debug, Default)]
pub struct TransformOp;

impl TransformOp {
    pub const PORT_COMMAND: &'static str = "command";
    pub const PORT_TRANSLATION: &'static str = "translation";
    pub const PORT_ROTATION: &'static str = "rotation";
    pub const PORT_SCALE: &'static str = "scale";
    pub const PORT_RESULT: &'static str = "result";
}

impl OperatorDescriptor for TransformOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "transform".to_string(),
            category: OperatorCategory::Transform,
            label: "Transform".to_string(),
            description: "Moves, rotates and scales a subgraph".to_string(),
            inputs: vec![
                InputMetadata::new(Self::PORT_COMMAND, "Command", ValueType::Any),
                InputMetadata::new(Self::PORT_TRANSLATION, "Translation", ValueType::Vec3),
                InputMetadata::new(Self::PORT_ROTATION, "Rotation", ValueType::Vec3),
                InputMetadata::new(Self::PORT_SCALE, "Scale", ValueType::Vec3).with_default(Vec3::ONE),
            ],
            outputs: vec![OutputMetadata::new(Self::PORT_RESULT, "Result", ValueType::Any).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: TransformOp::descriptor,
    factory: || Box::new(TransformOp),
});

impl Operator for TransformOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let translation = inputs.pull_vec3(Self::PORT_TRANSLATION, ctx)?;
        let rotation = inputs.pull_vec3(Self::PORT_ROTATION, ctx)?;
        let scale = inputs.pull_vec3(Self::PORT_SCALE, ctx)?;

        let mut scope = ctx.scoped();
        scope.object_to_world = scope.object_to_world * compose_transform(translation, rotation, scale);
        inputs.pull(Self::PORT_COMMAND, &mut scope)
    }

    fn as_transformable(&self) -> Option<&dyn Transformable> {
        Some(self)
    }
}

impl Transformable for TransformOp {
    fn transform_input_ids(&self) -> TransformInputs {
        TransformInputs {
            translation: Some(Self::PORT_TRANSLATION.to_string()),
            rotation: Some(Self::PORT_ROTATION.to_string()),
            scale: Some(Self::PORT_SCALE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let m = compose_transform(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_rotation_is_in_degrees() {
        let m = compose_transform(Vec3::ZERO, Vec3::new(0.0, 0.0, 90.0), Vec3::ONE);
        let x = m.transform_point3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_scale_then_translate() {
        let m = compose_transform(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::splat(2.0));
        assert!(m.transform_point3(Vec3::X).abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_gizmo_inputs() {
        let ids = TransformOp.transform_input_ids();
        assert_eq!(ids.translation.as_deref(), Some("translation"));
        assert_eq!(ids.scale.as_deref(), Some("scale"));
    }
}
