//! Get Resolution Operator

use operator_engine::{
    EvaluationContext, Inputs, Operator, OperatorCategory, OperatorDescriptor, OperatorMetadata,
    OutputMetadata, Result, Value, ValueType,
};

/// Requested render resolution of the current pull, as a `Vec2`
#[derive(Debug, Default)]
pub struct GetResolutionOp;

impl GetResolutionOp {
    pub const PORT_RESOLUTION: &'static str = "resolution";
    /// Width over height
    pub const PORT_ASPECT: &'static str = "aspect";
}

impl OperatorDescriptor for GetResolutionOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "get-resolution".to_string(),
            category: OperatorCategory::Context,
            label: "Resolution".to_string(),
            description: "Resolution requested by the caller".to_string(),
            inputs: Vec::new(),
            outputs: vec![
                OutputMetadata::new(Self::PORT_RESOLUTION, "Resolution", ValueType::Vec2).always(),
                OutputMetadata::new(Self::PORT_ASPECT, "Aspect", ValueType::Float).always(),
            ],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: GetResolutionOp::descriptor,
    factory: || Box::new(GetResolutionOp),
});

impl Operator for GetResolutionOp {
    fn compute(
        &mut self,
        output: &str,
        _inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let resolution = ctx.requested_resolution.as_vec2();
        match output {
            Self::PORT_ASPECT if resolution.y > 0.0 => Ok(Value::Float(resolution.x / resolution.y)),
            Self::PORT_ASPECT => Ok(Value::Float(1.0)),
            _ => Ok(Value::Vec2(resolution)),
        }
    }
}
