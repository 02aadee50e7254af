//! Curve Sample Operator
//!
//! Samples a curve described inline by its `keys` input at the local time
//! of the pull. Unlike animated inputs, the curve holds its first and last
//! values outside the keyed range.

use operator_engine::{
    Curve, EvaluationContext, InputMetadata, Inputs, Interpolation, Keyframe, Operator,
    OperatorCategory, OperatorDescriptor, OperatorMetadata, OutputMetadata, Result, Value,
    ValueType,
};

/// Build a curve from `(time, value)` pairs stored as `Vec2` items.
///
/// Items that are not 2D vectors are skipped.
pub fn curve_from_keys(keys: &[Value], interpolation: Interpolation) -> Curve {
    Curve::from_keys(keys.iter().filter_map(|item| {
        item.as_vec2().map(|key| {
            Keyframe::new(f64::from(key.x), f64::from(key.y), interpolation)
        })
    }))
}

/// Curve Sample Operator
///
/// # Inputs
/// - `keys` - List of `Vec2(time, value)` keys
/// - `stepped` - Hold each key until the next one instead of blending
///
/// # Outputs
/// - `value` - Curve value at local time (0 for an empty curve)
#[derive(Debug, Default)]
pub struct CurveSampleOp;

impl CurveSampleOp {
    pub const PORT_KEYS: &'static str = "keys";
    pub const PORT_STEPPED: &'static str = "stepped";
    pub const PORT_VALUE: &'static str = "value";
}

impl OperatorDescriptor for CurveSampleOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "curve-sample".to_string(),
            category: OperatorCategory::Animation,
            label: "Curve".to_string(),
            description: "Samples an inline keyframe curve at local time".to_string(),
            inputs: vec![
                InputMetadata::new(Self::PORT_KEYS, "Keys", ValueType::List),
                InputMetadata::new(Self::PORT_STEPPED, "Stepped", ValueType::Bool),
            ],
            outputs: vec![OutputMetadata::new(Self::PORT_VALUE, "Value", ValueType::Float).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: CurveSampleOp::descriptor,
    factory: || Box::new(CurveSampleOp),
});

impl Operator for CurveSampleOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let keys = inputs.pull(Self::PORT_KEYS, ctx)?;
        let interpolation = if inputs.pull_bool(Self::PORT_STEPPED, ctx)? {
            Interpolation::Constant
        } else {
            Interpolation::Linear
        };
        let curve = curve_from_keys(keys.as_list().unwrap_or_default(), interpolation);
        Ok(Value::Float(curve.sample(ctx.local_time) as f32))
    }
}
