//! Add Operator
//!
//! Sums every connection of its multi-input, in ordinal order.

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Add Operator
///
/// # Inputs
/// - `values` (multiple) - Floats to sum; an unconnected input sums to 0
///
/// # Outputs
/// - `result` - The sum
#[derive(Debug, Default)]
pub struct AddOp;

impl AddOp {
    /// Port ID for the summands (accepts multiple connections)
    pub const PORT_VALUES: &'static str = "values";
    pub const PORT_RESULT: &'static str = "result";
}

impl OperatorDescriptor for AddOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "add".to_string(),
            category: OperatorCategory::Math,
            label: "Add".to_string(),
            description: "Sums any number of floats".to_string(),
            inputs: vec![InputMetadata::new(Self::PORT_VALUES, "Values", ValueType::Float).multiple()],
            outputs: vec![OutputMetadata::new(Self::PORT_RESULT, "Result", ValueType::Float)],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: AddOp::descriptor,
    factory: || Box::new(AddOp),
});

impl Operator for AddOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let values = inputs.pull_multi(Self::PORT_VALUES, ctx)?;
        let sum: f32 = values.iter().filter_map(Value::as_float).sum();
        log::debug!("AddOp: summed {} values to {}", values.len(), sum);
        Ok(Value::Float(sum))
    }
}
