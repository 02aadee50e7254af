//! Float Value Operator
//!
//! A literal float source. Its input is the usual target for overrides,
//! keyframes and host leaf injection.

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Float Value Operator
///
/// # Inputs
/// - `value` - The float to emit (default 0.0)
///
/// # Outputs
/// - `result` - The same float
#[derive(Debug, Default)]
pub struct FloatValueOp;

impl FloatValueOp {
    /// Port ID for the value input
    pub const PORT_VALUE: &'static str = "value";
    /// Port ID for the result output
    pub const PORT_RESULT: &'static str = "result";
}

impl OperatorDescriptor for FloatValueOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "float-value".to_string(),
            category: OperatorCategory::Value,
            label: "Float".to_string(),
            description: "Emits a single float".to_string(),
            inputs: vec![InputMetadata::new(Self::PORT_VALUE, "Value", ValueType::Float)],
            outputs: vec![OutputMetadata::new(Self::PORT_RESULT, "Result", ValueType::Float)],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: FloatValueOp::descriptor,
    factory: || Box::new(FloatValueOp),
});

impl Operator for FloatValueOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        Ok(Value::Float(inputs.pull_float(Self::PORT_VALUE, ctx)?))
    }
}
