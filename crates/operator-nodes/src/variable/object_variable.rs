//! Object variable operators
//!
//! Same scoping rules as the float variables, but the bound object is any
//! `Value` (lists, matrices, text). The context stores it type-erased and
//! the getter reads it back as a `Value`.

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

use super::float_variable::{PORT_COMMAND, PORT_FALLBACK, PORT_KEY, PORT_RESULT, PORT_VALUE};

const DEFAULT_KEY: &str = "object";

/// Binds `value` under `key` while pulling `command`
#[derive(Debug, Default)]
pub struct SetObjectVariableOp;

impl OperatorDescriptor for SetObjectVariableOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "set-object-variable".to_string(),
            category: OperatorCategory::Variable,
            label: "Set Object Variable".to_string(),
            description: "Binds a named value while evaluating its command".to_string(),
            inputs: vec![
                InputMetadata::new(PORT_KEY, "Key", ValueType::Text).with_default(DEFAULT_KEY),
                InputMetadata::new(PORT_VALUE, "Value", ValueType::Any),
                InputMetadata::new(PORT_COMMAND, "Command", ValueType::Any),
            ],
            outputs: vec![OutputMetadata::new(PORT_RESULT, "Result", ValueType::Any).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: SetObjectVariableOp::descriptor,
    factory: || Box::new(SetObjectVariableOp),
});

impl Operator for SetObjectVariableOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let key = inputs.pull_text(PORT_KEY, ctx)?;
        let value = inputs.pull(PORT_VALUE, ctx)?;
        let mut scope = ctx.scoped();
        scope.set_object_variable(key, value);
        inputs.pull(PORT_COMMAND, &mut scope)
    }
}

/// Reads the value bound under `key`, or `fallback`
#[derive(Debug, Default)]
pub struct GetObjectVariableOp;

impl OperatorDescriptor for GetObjectVariableOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "get-object-variable".to_string(),
            category: OperatorCategory::Variable,
            label: "Get Object Variable".to_string(),
            description: "Reads a named value bound by an enclosing setter".to_string(),
            inputs: vec![
                InputMetadata::new(PORT_KEY, "Key", ValueType::Text).with_default(DEFAULT_KEY),
                InputMetadata::new(PORT_FALLBACK, "Fallback", ValueType::Any),
            ],
            outputs: vec![OutputMetadata::new(PORT_RESULT, "Result", ValueType::Any).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: GetObjectVariableOp::descriptor,
    factory: || Box::new(GetObjectVariableOp),
});

impl Operator for GetObjectVariableOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let key = inputs.pull_text(PORT_KEY, ctx)?;
        if let Some(value) = ctx.object_variable::<Value>(&key).cloned() {
            return Ok(value);
        }
        inputs.pull(PORT_FALLBACK, ctx)
    }
}
