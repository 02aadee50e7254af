//! Multiply Operator

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Multiplies `a` by `b`. Both default to 1 so an unconnected side is a
/// no-op.
#[derive(Debug, Default)]
pub struct MultiplyOp;

impl MultiplyOp {
    pub const PORT_A: &'static str = "a";
    pub const PORT_B: &'static str = "b";
    pub const PORT_RESULT: &'static str = "result";
}

impl OperatorDescriptor for MultiplyOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "multiply".to_string(),
            category: OperatorCategory::Math,
            label: "Multiply".to_string(),
            description: "Multiplies two floats".to_string(),
            inputs: vec![
                InputMetadata::new(Self::PORT_A, "A", ValueType::Float).with_default(1.0f32),
                InputMetadata::new(Self::PORT_B, "B", ValueType::Float).with_default(1.0f32),
            ],
            outputs: vec![OutputMetadata::new(Self::PORT_RESULT, "Result", ValueType::Float)],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: MultiplyOp::descriptor,
    factory: || Box::new(MultiplyOp),
});

impl Operator for MultiplyOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let a = inputs.pull_float(Self::PORT_A, ctx)?;
        let b = inputs.pull_float(Self::PORT_B, ctx)?;
        Ok(Value::Float(a * b))
    }
}
