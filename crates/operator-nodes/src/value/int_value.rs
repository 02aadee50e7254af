//! Int Value Operator

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Emits its `value` input as an integer
#[derive(Debug, Default)]
pub struct IntValueOp;

impl IntValueOp {
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_RESULT: &'static str = "result";
}

impl OperatorDescriptor for IntValueOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "int-value".to_string(),
            category: OperatorCategory::Value,
            label: "Int".to_string(),
            description: "Emits a single integer".to_string(),
            inputs: vec![InputMetadata::new(Self::PORT_VALUE, "Value", ValueType::Int)],
            outputs: vec![OutputMetadata::new(Self::PORT_RESULT, "Result", ValueType::Int)],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: IntValueOp::descriptor,
    factory: || Box::new(IntValueOp),
});

impl Operator for IntValueOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        Ok(Value::Int(inputs.pull_int(Self::PORT_VALUE, ctx)?))
    }
}
